use sqlx::SqliteConnection;

use crate::db_types::MarketplaceAccount;

/// Fetches the active seller account. When more than one account is marked active, the most recently updated one
/// wins.
pub async fn fetch_active_account(conn: &mut SqliteConnection) -> Result<Option<MarketplaceAccount>, sqlx::Error> {
    let account =
        sqlx::query_as("SELECT * FROM marketplace_accounts WHERE active = 1 ORDER BY updated_at DESC, id DESC LIMIT 1")
            .fetch_optional(conn)
            .await?;
    Ok(account)
}
