use crate::model::role::Role;
use derive_new::new;

#[derive(new, Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
}
