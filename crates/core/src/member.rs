//! Members.

use serde::Serialize;

use crate::types::{Address, MemberGrade, MemberId, Orderer, Username};

/// A registered shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub username: Username,
    pub name: String,
    pub address: Option<Address>,
    pub grade: MemberGrade,
}

impl Member {
    /// The orderer reference embedded in orders this member places.
    #[must_use]
    pub fn as_orderer(&self) -> Orderer {
        Orderer {
            member_id: self.id,
            name: self.name.clone(),
        }
    }

    pub fn change_address(&mut self, address: Address) {
        self.address = Some(address);
    }
}

/// A member that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub username: Username,
    pub name: String,
    pub address: Option<Address>,
    pub password_hash: String,
}
