use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewSaleRecord, SaleRecord};

/// Inserts the record, or updates the row that carries the same natural key `(record_type, pack_id, order_id,
/// item_id)`. Returns the stored row and `true` when a new row was inserted.
///
/// The existence check uses `IS` rather than `=` so that NULL dimensions match NULL columns. Wrap the call in a
/// transaction (passing `&mut *tx` as the connection argument) to make the check-and-write atomic; the unique index
/// over the natural key backstops any writer that does not.
pub async fn upsert_sale_record(
    record: NewSaleRecord,
    conn: &mut SqliteConnection,
) -> Result<(SaleRecord, bool), sqlx::Error> {
    let existing_id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM sales WHERE record_type = $1 AND pack_id IS $2 AND order_id IS $3 AND item_id IS $4",
    )
    .bind(record.record_type)
    .bind(record.pack_id.clone())
    .bind(record.order_id)
    .bind(record.item_id.clone())
    .fetch_optional(&mut *conn)
    .await?;
    let key = record.key_description();
    match existing_id {
        Some(id) => {
            let updated = update_sale_record(id, record, conn).await?;
            debug!("🧾️ Sale record {key} refreshed existing row {id}");
            Ok((updated, false))
        },
        None => {
            let inserted = insert_sale_record(record, conn).await?;
            debug!("🧾️ Sale record {key} inserted with id {}", inserted.id);
            Ok((inserted, true))
        },
    }
}

async fn insert_sale_record(record: NewSaleRecord, conn: &mut SqliteConnection) -> Result<SaleRecord, sqlx::Error> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO sales (
                record_type, order_id, item_id, pack_id, is_pack,
                item_title, sku, quantity, unit_price, marketplace_fee, listing_type,
                buyer_id, buyer_name, order_status, status_detail,
                sold_at, order_updated_at, closed_at,
                total_amount, paid_amount, currency, sales_channel,
                payment_method, payment_type, installments, financing_fee, installment_details, approved_at,
                shipment_id, shipping_status, shipping_substatus, tracking_number, carrier,
                zip_code, address_line, city, state, country,
                shipment_created_at, estimated_delivery_at, delivered_at,
                seller_shipping_cost, buyer_shipping_cost, shipping_paid_by, shipping_subsidy, shipping_list_cost,
                shipping_cost_type,
                cancelled_at, cancellation_reason, cancelled_by,
                has_refund, refund_amount, refunded_at,
                claim_id, claim_reason
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35, $36, $37, $38, $39, $40,
                $41, $42, $43, $44, $45, $46, $47, $48, $49, $50, $51, $52, $53, $54, $55
            )
            RETURNING *;
        "#,
    )
    .bind(record.record_type)
    .bind(record.order_id)
    .bind(record.item_id)
    .bind(record.pack_id)
    .bind(record.is_pack)
    .bind(record.item_title)
    .bind(record.sku)
    .bind(record.quantity)
    .bind(record.unit_price)
    .bind(record.marketplace_fee)
    .bind(record.listing_type)
    .bind(record.buyer_id)
    .bind(record.buyer_name)
    .bind(record.order_status)
    .bind(record.status_detail)
    .bind(record.sold_at)
    .bind(record.order_updated_at)
    .bind(record.closed_at)
    .bind(record.total_amount)
    .bind(record.paid_amount)
    .bind(record.currency)
    .bind(record.sales_channel)
    .bind(record.payment_method)
    .bind(record.payment_type)
    .bind(record.installments)
    .bind(record.financing_fee)
    .bind(record.installment_details)
    .bind(record.approved_at)
    .bind(record.shipment_id)
    .bind(record.shipping_status)
    .bind(record.shipping_substatus)
    .bind(record.tracking_number)
    .bind(record.carrier)
    .bind(record.zip_code)
    .bind(record.address_line)
    .bind(record.city)
    .bind(record.state)
    .bind(record.country)
    .bind(record.shipment_created_at)
    .bind(record.estimated_delivery_at)
    .bind(record.delivered_at)
    .bind(record.seller_shipping_cost)
    .bind(record.buyer_shipping_cost)
    .bind(record.shipping_paid_by)
    .bind(record.shipping_subsidy)
    .bind(record.shipping_list_cost)
    .bind(record.shipping_cost_type)
    .bind(record.cancelled_at)
    .bind(record.cancellation_reason)
    .bind(record.cancelled_by)
    .bind(record.has_refund)
    .bind(record.refund_amount)
    .bind(record.refunded_at)
    .bind(record.claim_id)
    .bind(record.claim_reason)
    .fetch_one(conn)
    .await?;
    Ok(inserted)
}

/// Overwrites every column except the natural key and `created_at` on the row with the given id.
async fn update_sale_record(
    id: i64,
    record: NewSaleRecord,
    conn: &mut SqliteConnection,
) -> Result<SaleRecord, sqlx::Error> {
    let updated = sqlx::query_as(
        r#"
            UPDATE sales SET
                is_pack = $1,
                item_title = $2,
                sku = $3,
                quantity = $4,
                unit_price = $5,
                marketplace_fee = $6,
                listing_type = $7,
                buyer_id = $8,
                buyer_name = $9,
                order_status = $10,
                status_detail = $11,
                sold_at = $12,
                order_updated_at = $13,
                closed_at = $14,
                total_amount = $15,
                paid_amount = $16,
                currency = $17,
                sales_channel = $18,
                payment_method = $19,
                payment_type = $20,
                installments = $21,
                financing_fee = $22,
                installment_details = $23,
                approved_at = $24,
                shipment_id = $25,
                shipping_status = $26,
                shipping_substatus = $27,
                tracking_number = $28,
                carrier = $29,
                zip_code = $30,
                address_line = $31,
                city = $32,
                state = $33,
                country = $34,
                shipment_created_at = $35,
                estimated_delivery_at = $36,
                delivered_at = $37,
                seller_shipping_cost = $38,
                buyer_shipping_cost = $39,
                shipping_paid_by = $40,
                shipping_subsidy = $41,
                shipping_list_cost = $42,
                shipping_cost_type = $43,
                cancelled_at = $44,
                cancellation_reason = $45,
                cancelled_by = $46,
                has_refund = $47,
                refund_amount = $48,
                refunded_at = $49,
                claim_id = $50,
                claim_reason = $51,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $52
            RETURNING *;
        "#,
    )
    .bind(record.is_pack)
    .bind(record.item_title)
    .bind(record.sku)
    .bind(record.quantity)
    .bind(record.unit_price)
    .bind(record.marketplace_fee)
    .bind(record.listing_type)
    .bind(record.buyer_id)
    .bind(record.buyer_name)
    .bind(record.order_status)
    .bind(record.status_detail)
    .bind(record.sold_at)
    .bind(record.order_updated_at)
    .bind(record.closed_at)
    .bind(record.total_amount)
    .bind(record.paid_amount)
    .bind(record.currency)
    .bind(record.sales_channel)
    .bind(record.payment_method)
    .bind(record.payment_type)
    .bind(record.installments)
    .bind(record.financing_fee)
    .bind(record.installment_details)
    .bind(record.approved_at)
    .bind(record.shipment_id)
    .bind(record.shipping_status)
    .bind(record.shipping_substatus)
    .bind(record.tracking_number)
    .bind(record.carrier)
    .bind(record.zip_code)
    .bind(record.address_line)
    .bind(record.city)
    .bind(record.state)
    .bind(record.country)
    .bind(record.shipment_created_at)
    .bind(record.estimated_delivery_at)
    .bind(record.delivered_at)
    .bind(record.seller_shipping_cost)
    .bind(record.buyer_shipping_cost)
    .bind(record.shipping_paid_by)
    .bind(record.shipping_subsidy)
    .bind(record.shipping_list_cost)
    .bind(record.shipping_cost_type)
    .bind(record.cancelled_at)
    .bind(record.cancellation_reason)
    .bind(record.cancelled_by)
    .bind(record.has_refund)
    .bind(record.refund_amount)
    .bind(record.refunded_at)
    .bind(record.claim_id)
    .bind(record.claim_reason)
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(updated)
}

pub async fn fetch_sale_records_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<SaleRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM sales WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(records)
}

pub async fn fetch_sale_records_for_pack(
    pack_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<SaleRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM sales WHERE pack_id = $1 ORDER BY id ASC")
        .bind(pack_id)
        .fetch_all(conn)
        .await?;
    Ok(records)
}
