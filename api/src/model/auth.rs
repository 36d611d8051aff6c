use crate::model::user::RoleName;
use garde::Validate;
use kernel::model::{role::Role, user::event::CreateUser};
use serde::Deserialize;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[garde(email)]
    email: String,
    #[garde(length(min = 6))]
    password: String,
    #[garde(length(min = 1))]
    display_name: String,
    #[garde(skip)]
    #[serde(default)]
    role: Option<RoleName>,
}

impl From<RegisterRequest> for CreateUser {
    fn from(value: RegisterRequest) -> Self {
        let RegisterRequest {
            email,
            password,
            display_name,
            role,
        } = value;
        Self {
            email,
            password,
            display_name,
            role: role.map(Role::from).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register(body: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn role_defaults_to_user() {
        let req = register(json!({
            "email": "mio@example.com",
            "password": "secret1",
            "displayName": "Mio"
        }));
        assert!(req.validate(&()).is_ok());
        let event = CreateUser::from(req);
        assert_eq!(event.role, Role::User);
        assert_eq!(event.display_name, "Mio");
    }

    #[test]
    fn short_password_and_bad_email_are_rejected() {
        let req = register(json!({
            "email": "not-an-email",
            "password": "12345",
            "displayName": "Mio",
            "role": "admin"
        }));
        assert!(req.validate(&()).is_err());
    }

    #[test]
    fn admin_role_is_kept() {
        let req = register(json!({
            "email": "ren@example.com",
            "password": "secret1",
            "displayName": "Ren",
            "role": "admin"
        }));
        assert_eq!(CreateUser::from(req).role, Role::Admin);
    }
}
