//! Member administration.

use bazaar_core::MemberGrade;

use super::{CommandError, connect};

/// Set a member's loyalty grade.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` if no member has that username.
pub async fn set_grade(username: &str, grade: MemberGrade) -> Result<(), CommandError> {
    let pool = connect().await?;

    let result = sqlx::query("UPDATE members SET grade = $1 WHERE username = $2")
        .bind(grade)
        .bind(username)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CommandError::InvalidArgument(format!(
            "no member named '{username}'"
        )));
    }

    tracing::info!(username, ?grade, "Member grade updated");
    Ok(())
}
