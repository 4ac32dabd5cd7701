use log::*;
use meli_sales_engine::{
    db_types::{NewSaleRecord, RecordType},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SalesLedger,
};
use msp_common::Brl;
use tokio::runtime::Runtime;

#[test]
fn upserts_are_keyed_on_the_natural_key() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = prepare_test_env(&random_db_path()).await;

        let record = NewSaleRecord {
            record_type: RecordType::Sale,
            order_id: Some(2000001111),
            item_id: Some("MLB111".to_string()),
            item_title: Some("Capa de celular".to_string()),
            quantity: Some(2),
            total_amount: Some(Brl::from(25980)),
            order_status: Some("Pago".to_string()),
            ..NewSaleRecord::default()
        };
        let first = db.upsert_sale_record(record.clone()).await.expect("Error inserting sale record");

        // Reconciling the same order again overwrites the row instead of duplicating it.
        let mut second = record.clone();
        second.order_status = Some("Cancelado".to_string());
        second.total_amount = Some(Brl::from(0));
        let updated = db.upsert_sale_record(second).await.expect("Error upserting sale record");

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.order_status.as_deref(), Some("Cancelado"));
        assert_eq!(updated.total_amount, Some(Brl::from(0)));
        assert_eq!(updated.created_at, first.created_at);

        let rows = db.fetch_sale_records_for_order(2000001111).await.expect("Error fetching rows");
        assert_eq!(rows.len(), 1);
    });
    info!("🚀️ upsert test complete");
}

#[test]
fn null_dimensions_participate_in_the_key() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = prepare_test_env(&random_db_path()).await;

        // A pack summary row has no order or item dimension; its item rows have all three.
        let pack_row = NewSaleRecord {
            record_type: RecordType::Pack,
            pack_id: Some("555".to_string()),
            is_pack: true,
            item_title: Some("PACOTE - 2 itens".to_string()),
            quantity: Some(2),
            total_amount: Some(Brl::from(26000)),
            ..NewSaleRecord::default()
        };
        let item_a = NewSaleRecord {
            record_type: RecordType::PackItem,
            pack_id: Some("555".to_string()),
            order_id: Some(3101),
            item_id: Some("MLB1".to_string()),
            is_pack: true,
            ..NewSaleRecord::default()
        };
        let item_b = NewSaleRecord {
            record_type: RecordType::PackItem,
            pack_id: Some("555".to_string()),
            order_id: Some(3102),
            item_id: Some("MLB2".to_string()),
            is_pack: true,
            ..NewSaleRecord::default()
        };
        db.upsert_sale_record(pack_row.clone()).await.expect("Error inserting pack row");
        db.upsert_sale_record(item_a).await.expect("Error inserting item row");
        db.upsert_sale_record(item_b).await.expect("Error inserting item row");

        let rows = db.fetch_sale_records_for_pack("555").await.expect("Error fetching pack rows");
        assert_eq!(rows.len(), 3);

        // Upserting the summary row again matches the existing NULL-keyed row.
        let mut again = pack_row;
        again.quantity = Some(3);
        again.item_title = Some("PACOTE - 3 itens".to_string());
        let updated = db.upsert_sale_record(again).await.expect("Error upserting pack row");
        assert_eq!(updated.quantity, Some(3));

        let rows = db.fetch_sale_records_for_pack("555").await.expect("Error fetching pack rows");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| r.record_type == RecordType::Pack).count(), 1);
    });
}

#[test]
fn record_types_never_collide() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = prepare_test_env(&random_db_path()).await;

        let sale = NewSaleRecord {
            record_type: RecordType::Sale,
            order_id: Some(777),
            item_id: Some("MLB9".to_string()),
            ..NewSaleRecord::default()
        };
        let sale_item = NewSaleRecord { record_type: RecordType::SaleItem, ..sale.clone() };
        db.upsert_sale_record(sale).await.expect("Error inserting sale");
        db.upsert_sale_record(sale_item).await.expect("Error inserting sale item");

        let rows = db.fetch_sale_records_for_order(777).await.expect("Error fetching rows");
        assert_eq!(rows.len(), 2);
    });
}

#[test]
fn order_lookup_includes_pack_item_rows() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = prepare_test_env(&random_db_path()).await;

        let item = NewSaleRecord {
            record_type: RecordType::PackItem,
            pack_id: Some("901".to_string()),
            order_id: Some(4242),
            item_id: Some("MLB77".to_string()),
            is_pack: true,
            ..NewSaleRecord::default()
        };
        db.upsert_sale_record(item).await.expect("Error inserting item row");

        let rows = db.fetch_sale_records_for_order(4242).await.expect("Error fetching rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pack_id.as_deref(), Some("901"));
        assert!(rows[0].is_pack);
    });
}
