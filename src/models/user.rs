use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Review author (collection `users`, read-only for this service)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(rename = "profilePicture", default)]
    pub profile_picture: String,
}

impl User {
    /// "{firstname} {lastname}"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    /// "{lastname} {firstname}", the second form matched by name search
    pub fn reversed_name(&self) -> String {
        format!("{} {}", self.lastname, self.firstname)
    }

    /// Case-insensitive substring match against both name orders
    pub fn matches_name(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.display_name().to_lowercase().contains(&pattern)
            || self.reversed_name().to_lowercase().contains(&pattern)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub profile_picture: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: ObjectId::new(),
            firstname: self.firstname,
            lastname: self.lastname,
            profile_picture: self.profile_picture,
        }
    }
}
