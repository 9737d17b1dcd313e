use crate::models::{AccessLevel, FileRecord, Requester};

/// Whether `requester` may download `file`. Shared by list annotation and the
/// download gate, so both always agree.
///
/// - `public`: everyone, anonymous included
/// - `department`: requester's department equals the owner's department
/// - `personal`: requester is the owner
pub fn can_access(file: &FileRecord, requester: Option<&Requester>) -> bool {
    match (file.access_level, requester) {
        (AccessLevel::Public, _) => true,
        (_, None) => false,
        (AccessLevel::Department, Some(requester)) => match requester.department_id {
            Some(department_id) => file.owner_department_id == Some(department_id),
            None => false,
        },
        (AccessLevel::Personal, Some(requester)) => requester.id == file.owner_id,
    }
}
