use chrono::{Duration, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::{
    NewNotification, Notification, NotificationPage, NotificationQuery, NotificationStatistics, NotificationUpdate,
    DEFAULT_PAGE_SIZE,
};

/// Stores a notification. The store is idempotent on `notification_id`: a redelivery merges its non-null fields over
/// the existing row, takes the new `received_at`, and re-opens the notification (`processed = 0`) so that the queue
/// can pick it up again. The row id, `created_at` and any previous processing outcome are preserved.
///
/// The merge happens in a single `INSERT .. ON CONFLICT` statement so that two concurrent deliveries of the same
/// notification can never produce two rows.
pub async fn store_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    let stored: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (
                notification_id,
                resource,
                topic,
                user_id,
                application_id,
                attempts,
                sent_at,
                received_at,
                request_data,
                processed
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0)
            ON CONFLICT (notification_id) DO UPDATE SET
                resource = COALESCE(excluded.resource, notifications.resource),
                topic = COALESCE(excluded.topic, notifications.topic),
                user_id = COALESCE(excluded.user_id, notifications.user_id),
                application_id = COALESCE(excluded.application_id, notifications.application_id),
                attempts = COALESCE(excluded.attempts, notifications.attempts),
                sent_at = COALESCE(excluded.sent_at, notifications.sent_at),
                received_at = excluded.received_at,
                request_data = COALESCE(excluded.request_data, notifications.request_data),
                processed = 0,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(notification.notification_id)
    .bind(notification.resource)
    .bind(notification.topic)
    .bind(notification.user_id)
    .bind(notification.application_id)
    .bind(notification.attempts)
    .bind(notification.sent_at)
    .bind(notification.received_at)
    .bind(notification.request_data)
    .fetch_one(conn)
    .await?;
    debug!("📬️ Notification {} stored with id {}", stored.notification_id, stored.id);
    Ok(stored)
}

pub async fn fetch_notification_by_notification_id(
    notification_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    let notification = sqlx::query_as("SELECT * FROM notifications WHERE notification_id = $1")
        .bind(notification_id)
        .fetch_optional(conn)
        .await?;
    Ok(notification)
}

/// Applies a partial update to the notification with the given `notification_id`. Fields that are `None` in the
/// update are left untouched. Returns `None` when the notification does not exist.
pub async fn update_notification(
    notification_id: &str,
    update: NotificationUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    let updated = sqlx::query_as(
        r#"
            UPDATE notifications SET
                processed = COALESCE($1, processed),
                processed_at = COALESCE($2, processed_at),
                error_message = COALESCE($3, error_message),
                response_data = COALESCE($4, response_data),
                attempts = COALESCE($5, attempts),
                updated_at = CURRENT_TIMESTAMP
            WHERE notification_id = $6
            RETURNING *;
        "#,
    )
    .bind(update.processed)
    .bind(update.processed_at)
    .bind(update.error_message)
    .bind(update.response_data)
    .bind(update.attempts)
    .bind(notification_id)
    .fetch_optional(conn)
    .await?;
    Ok(updated)
}

/// Fetches up to `limit` unprocessed order notifications, most recently received first. Notifications for other
/// topics are excluded since the reconciler has nothing to do with them.
pub async fn fetch_unprocessed_notifications(
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as(
        "SELECT * FROM notifications WHERE processed = 0 AND topic = 'orders' ORDER BY received_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(notifications)
}

fn push_notification_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &NotificationQuery) {
    if query.processed.is_some() || query.topic.is_some() {
        builder.push(" WHERE ");
        let mut where_clause = builder.separated(" AND ");
        if let Some(processed) = query.processed {
            where_clause.push("processed = ");
            where_clause.push_bind_unseparated(processed);
        }
        if let Some(topic) = &query.topic {
            where_clause.push("topic = ");
            where_clause.push_bind_unseparated(topic.clone());
        }
    }
}

/// Fetches notifications according to the criteria in the `NotificationQuery`, most recently received first, along
/// with the total number of rows matching the filter (ignoring pagination).
pub async fn search_notifications(
    query: NotificationQuery,
    conn: &mut SqliteConnection,
) -> Result<NotificationPage, sqlx::Error> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM notifications");
    push_notification_filters(&mut count_builder, &query);
    let total: i64 = count_builder.build_query_scalar().fetch_one(&mut *conn).await?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let mut builder = QueryBuilder::new("SELECT * FROM notifications");
    push_notification_filters(&mut builder, &query);
    builder.push(" ORDER BY received_at DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);
    trace!("📬️ Executing query: {}", builder.sql());
    let data = builder.build_query_as::<Notification>().fetch_all(conn).await?;
    Ok(NotificationPage { data, total })
}

/// Aggregate counts over the notification journal.
pub async fn notification_statistics(conn: &mut SqliteConnection) -> Result<NotificationStatistics, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications").fetch_one(&mut *conn).await?;
    let processed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE processed = 1").fetch_one(&mut *conn).await?;
    let with_error: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE error_message IS NOT NULL AND error_message != ''")
            .fetch_one(&mut *conn)
            .await?;
    let cutoff = Utc::now() - Duration::hours(24);
    let last_24_hours: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE received_at >= $1")
        .bind(cutoff)
        .fetch_one(&mut *conn)
        .await?;
    let topics: Vec<(String, i64)> = sqlx::query_as(
        "SELECT COALESCE(topic, 'unknown') AS topic, COUNT(*) AS n FROM notifications GROUP BY COALESCE(topic, \
         'unknown')",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(NotificationStatistics {
        total,
        processed,
        unprocessed: total - processed,
        with_error,
        by_topic: topics.into_iter().collect(),
        last_24_hours,
    })
}
