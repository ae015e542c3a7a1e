//! Member queries.

use async_trait::async_trait;
use sqlx::FromRow;

use bazaar_core::member::{Member, NewMember};
use bazaar_core::{Address, MemberGrade, MemberId, Username};

use super::PgUnitOfWork;
use crate::db::{MemberRepository, RepositoryError, conflict_on_unique};

const MEMBER_COLUMNS: &str = "id, username, name, zip_code, address1, address2, grade";

#[derive(FromRow)]
struct MemberRow {
    id: MemberId,
    username: String,
    name: String,
    zip_code: Option<String>,
    address1: Option<String>,
    address2: Option<String>,
    grade: MemberGrade,
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    member: MemberRow,
    password_hash: String,
}

impl TryFrom<MemberRow> for Member {
    type Error = RepositoryError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        let address = match (row.zip_code, row.address1) {
            (Some(zip_code), Some(address1)) => Some(Address {
                zip_code,
                address1,
                address2: row.address2.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            username,
            name: row.name,
            address,
            grade: row.grade,
        })
    }
}

#[async_trait]
impl MemberRepository for PgUnitOfWork {
    async fn find_member(&mut self, id: MemberId) -> Result<Option<Member>, RepositoryError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1");
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    async fn find_member_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<Member>, RepositoryError> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE username = $1");
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Member::try_from)
            .transpose()
    }

    async fn find_member_credentials(
        &mut self,
        username: &str,
    ) -> Result<Option<(Member, String)>, RepositoryError> {
        let sql =
            format!("SELECT {MEMBER_COLUMNS}, password_hash FROM members WHERE username = $1");
        let Some(row) = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some((Member::try_from(row.member)?, row.password_hash)))
    }

    async fn insert_member(&mut self, member: NewMember) -> Result<Member, RepositoryError> {
        let (zip_code, address1, address2) = match member.address {
            Some(a) => (Some(a.zip_code), Some(a.address1), Some(a.address2)),
            None => (None, None, None),
        };

        let sql = format!(
            "INSERT INTO members (username, name, password_hash, zip_code, address1, address2) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {MEMBER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(member.username.as_str())
            .bind(&member.name)
            .bind(&member.password_hash)
            .bind(zip_code)
            .bind(address1)
            .bind(address2)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| conflict_on_unique(e, "username"))?;

        Member::try_from(row)
    }

    async fn update_member_address(
        &mut self,
        id: MemberId,
        address: &Address,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE members SET zip_code = $2, address1 = $3, address2 = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(&address.zip_code)
        .bind(&address.address1)
        .bind(&address.address2)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
