use serde::{Deserialize, Serialize};

/// The signed-in user, as handed over by the authentication layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UserSession {
    pub fn new(display_name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            display_name: display_name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    /// Display name, else email, else `None`. Blank values are skipped.
    pub fn label(&self) -> Option<&str> {
        [self.display_name.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}
