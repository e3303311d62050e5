//! Port error → [`ClipError`] mapping.

use cc_core::ports::{IdentityServiceError, StoreError};
use cc_core::ClipError;

pub(crate) fn from_store_error(err: StoreError) -> ClipError {
    match err {
        // A foreign document must look exactly like a missing one.
        StoreError::NotFound(id) | StoreError::PermissionDenied(id) => ClipError::NotFound(id),
        StoreError::Transport(reason) => ClipError::Transport(reason),
    }
}

pub(crate) fn from_identity_error(err: IdentityServiceError) -> ClipError {
    match err {
        IdentityServiceError::Credential(err) => ClipError::Credential(err),
        IdentityServiceError::InvalidCredentials | IdentityServiceError::UnknownUser(_) => {
            ClipError::Authentication
        }
        IdentityServiceError::Transport(reason) => ClipError::Transport(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::{EntryId, ErrorKind, UserId};

    #[test]
    fn permission_denied_is_indistinguishable_from_not_found() {
        let id = EntryId::from("e1");
        assert_eq!(
            from_store_error(StoreError::PermissionDenied(id.clone())),
            from_store_error(StoreError::NotFound(id))
        );
    }

    #[test]
    fn unknown_user_is_an_authentication_failure() {
        let err = from_identity_error(IdentityServiceError::UnknownUser(UserId::from("u")));
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }
}
