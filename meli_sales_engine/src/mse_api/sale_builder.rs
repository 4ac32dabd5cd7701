//! Builds ledger rows from fetched marketplace resources.
//!
//! Everything in this module is pure: the reconciler performs the remote fetches and hands the
//! resources over, so the derivation rules can be tested without a network or a database. The
//! field precedence rules (fetched shipment over the order's embedded `shipping` stanza, fetched
//! payment over the embedded one, first non-zero amount in a cost chain) are load-bearing and
//! mirror what sellers see in the marketplace UI.

use chrono::{DateTime, Utc};
use mercado_tools::{MercadoOrder, OrderItemEntry, OrderPayment, Shipment};
use msp_common::Brl;

use crate::{
    db_types::{NewSaleRecord, RecordType},
    helpers::{
        attribute_cancellation,
        describe_installments,
        translate_listing_type,
        translate_payment_method,
        translate_payment_type,
        translate_status,
        who_pays_shipping,
    },
};

/// JSON amounts are Reais with centavo precision; non-finite values cannot appear in parsed JSON.
fn brl(amount: Option<f64>) -> Option<Brl> {
    amount.and_then(|v| Brl::try_from(v).ok())
}

/// The first non-zero amount in the chain, as centavos. Zero is treated as "not set" so that a
/// free-shipping cost of 0 falls through to the next source, like the upstream dashboards do.
fn first_nonzero_brl(amounts: &[Option<f64>]) -> Brl {
    amounts
        .iter()
        .flatten()
        .find(|v| **v != 0.0)
        .and_then(|v| Brl::try_from(*v).ok())
        .unwrap_or_default()
}

//--------------------------------------    ShippingFacts      -------------------------------------------------------

/// The shipping columns of a ledger row, already translated and with cost defaults applied.
#[derive(Debug, Clone, Default)]
pub struct ShippingFacts {
    pub shipment_id: Option<i64>,
    pub status: Option<String>,
    pub substatus: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub zip_code: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub seller_cost: Brl,
    pub buyer_cost: Brl,
    pub paid_by: String,
    pub subsidy: Brl,
    pub list_cost: Brl,
    pub cost_type: String,
}

impl ShippingFacts {
    pub fn apply_to(&self, record: &mut NewSaleRecord) {
        record.shipment_id = self.shipment_id;
        record.shipping_status = self.status.clone();
        record.shipping_substatus = self.substatus.clone();
        record.tracking_number = self.tracking_number.clone();
        record.carrier = self.carrier.clone();
        record.zip_code = self.zip_code.clone();
        record.address_line = self.address_line.clone();
        record.city = self.city.clone();
        record.state = self.state.clone();
        record.country = self.country.clone();
        record.shipment_created_at = self.created_at;
        record.estimated_delivery_at = self.estimated_delivery_at;
        record.delivered_at = self.delivered_at;
        record.seller_shipping_cost = Some(self.seller_cost);
        record.buyer_shipping_cost = Some(self.buyer_cost);
        record.shipping_paid_by = Some(self.paid_by.clone());
        record.shipping_subsidy = Some(self.subsidy);
        record.shipping_list_cost = Some(self.list_cost);
        record.shipping_cost_type = Some(self.cost_type.clone());
    }
}

/// Derives the shipping columns from the fetched shipment, the order's embedded `shipping` stanza
/// and the payment, in that order of preference. The who-pays classification runs on the raw
/// (untranslated) status and cost type.
pub fn extract_shipping(
    shipment: Option<&Shipment>,
    order: &MercadoOrder,
    payment: Option<&OrderPayment>,
) -> ShippingFacts {
    let embedded = order.shipping.as_ref();
    let raw_status =
        shipment.and_then(|s| s.status.as_deref()).or_else(|| embedded.and_then(|s| s.status.as_deref()));
    let raw_substatus =
        shipment.and_then(|s| s.substatus.as_deref()).or_else(|| embedded.and_then(|s| s.substatus.as_deref()));
    let address = shipment
        .and_then(|s| s.receiver_address.as_ref())
        .or_else(|| shipment.and_then(|s| s.destination.as_ref()).and_then(|d| d.shipping_address.as_ref()))
        .or_else(|| embedded.and_then(|s| s.receiver_address.as_ref()));

    let seller_cost = brl(order.order_costs.as_ref().and_then(|c| c.shipping_fee)).unwrap_or_default();
    let subsidy = brl(order.order_costs.as_ref().and_then(|c| c.seller_shipping_discount)).unwrap_or_default();
    let buyer_cost = first_nonzero_brl(&[embedded.and_then(|s| s.cost), payment.and_then(|p| p.shipping_cost)]);
    let list_cost = first_nonzero_brl(&[
        shipment.and_then(|s| s.lead_time.as_ref()).and_then(|l| l.list_cost),
        shipment.and_then(|s| s.shipping_option.as_ref()).and_then(|o| o.list_cost),
    ]);
    let cost_type = embedded
        .and_then(|s| s.cost_type.clone())
        .or_else(|| shipment.and_then(|s| s.cost_type.clone()))
        .unwrap_or_else(|| "não informado".to_string());
    let paid_by = who_pays_shipping(&cost_type, seller_cost, subsidy, raw_status);

    let logistic_type = shipment
        .and_then(|s| s.logistic.as_ref())
        .and_then(|l| l.kind.clone())
        .or_else(|| embedded.and_then(|s| s.logistic_type.clone()));
    let carrier = shipment
        .and_then(|s| s.carrier.as_ref())
        .and_then(|c| c.name.clone())
        .or_else(|| shipment.and_then(|s| s.tracking_method.clone()))
        .or_else(|| embedded.and_then(|s| s.shipping_method.as_ref()).and_then(|m| m.name.clone()))
        .or(logistic_type);

    ShippingFacts {
        shipment_id: shipment.and_then(|s| s.id).or_else(|| embedded.and_then(|s| s.id)),
        status: translate_status(raw_status),
        substatus: translate_status(raw_substatus),
        tracking_number: shipment
            .and_then(|s| s.tracking_number.clone())
            .or_else(|| embedded.and_then(|s| s.tracking_number.clone())),
        carrier,
        zip_code: address.and_then(|a| a.zip_code.clone()),
        address_line: address.and_then(|a| a.address_line.clone()),
        city: address.and_then(|a| a.city.as_ref()).and_then(|v| v.name()).map(String::from),
        state: address.and_then(|a| a.state.as_ref()).and_then(|v| v.name()).map(String::from),
        country: address.and_then(|a| a.country.as_ref()).and_then(|v| v.name()).map(String::from),
        created_at: shipment.and_then(|s| s.date_created).or_else(|| embedded.and_then(|s| s.date_created)),
        estimated_delivery_at: shipment
            .and_then(|s| s.estimated_delivery_time.as_ref())
            .and_then(|e| e.date)
            .or_else(|| {
                shipment
                    .and_then(|s| s.shipping_option.as_ref())
                    .and_then(|o| o.estimated_delivery_time.as_ref())
                    .and_then(|e| e.date)
            }),
        delivered_at: shipment.and_then(|s| s.status_history.as_ref()).and_then(|h| h.date_delivered),
        seller_cost,
        buyer_cost,
        paid_by,
        subsidy,
        list_cost,
        cost_type,
    }
}

//--------------------------------------  CancellationFacts    -------------------------------------------------------

/// The cancellation, refund and mediation columns of a ledger row. The claim reason is filled in
/// by the reconciler after the mediation fetch; everything else derives from the order and payment.
#[derive(Debug, Clone, Default)]
pub struct CancellationFacts {
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub has_refund: bool,
    pub refund_amount: Option<Brl>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub claim_id: Option<i64>,
    pub claim_reason: Option<String>,
}

impl CancellationFacts {
    pub fn apply_to(&self, record: &mut NewSaleRecord) {
        record.cancelled_at = self.cancelled_at;
        record.cancellation_reason = self.cancellation_reason.clone();
        record.cancelled_by = self.cancelled_by.clone();
        record.has_refund = self.has_refund;
        record.refund_amount = self.refund_amount;
        record.refunded_at = self.refunded_at;
        record.claim_id = self.claim_id;
        record.claim_reason = self.claim_reason.clone();
    }
}

pub fn extract_cancellation(order: &MercadoOrder, payment: Option<&OrderPayment>) -> CancellationFacts {
    let mut facts = CancellationFacts { claim_id: order.mediation_id(), ..CancellationFacts::default() };

    if let Some(detail) = order.cancel_detail.as_ref() {
        facts.cancelled_at = detail.date_created.or(order.date_closed);
        facts.cancellation_reason =
            Some(detail.reason.clone().unwrap_or_else(|| "Motivo não especificado".to_string()));
        facts.cancelled_by = Some(attribute_cancellation(
            detail.cancelled_by.as_deref(),
            detail.reason.as_deref(),
            order.status_detail.as_deref(),
        ));
    }

    let refunds = payment.map(|p| p.refunds()).unwrap_or_default();
    if !refunds.is_empty() {
        facts.has_refund = true;
        let total: f64 = refunds.iter().map(|r| r.amount.unwrap_or_default()).sum();
        facts.refund_amount = Brl::try_from(total).ok();
        facts.refunded_at = refunds.first().and_then(|r| r.date_created);
    }

    facts
}

//--------------------------------------  Individual orders    -------------------------------------------------------

/// One ledger row per line item. A single-item order produces a `sale` row; a multi-item order
/// produces a `sale_item` row per item. An order with no line items produces no rows.
pub fn build_individual_records(
    order: &MercadoOrder,
    payment: Option<&OrderPayment>,
    shipping: &ShippingFacts,
    cancellation: &CancellationFacts,
) -> Vec<NewSaleRecord> {
    let items = order.items();
    let record_type = if items.len() == 1 { RecordType::Sale } else { RecordType::SaleItem };
    let buyer = order.buyer.as_ref();
    let financing_fee = brl(payment.and_then(|p| p.financing_fee_amount())).unwrap_or_default();
    let total_paid = first_nonzero_brl(&[order.paid_amount, payment.and_then(|p| p.total_paid_amount)]);
    let installments = payment.and_then(|p| p.installments);
    let installment_details = describe_installments(installments, total_paid);

    items
        .iter()
        .map(|entry| {
            let mut record = NewSaleRecord {
                record_type,
                order_id: order.id,
                item_id: entry.item_id().map(String::from),
                pack_id: None,
                is_pack: false,
                item_title: entry.title().map(String::from),
                sku: entry.sku().map(String::from),
                quantity: entry.quantity,
                unit_price: brl(entry.unit_price),
                marketplace_fee: Some(brl(entry.sale_fee).unwrap_or_default() * entry.quantity_or_one()),
                listing_type: Some(translate_listing_type(entry.listing_type_id.as_deref())),
                buyer_id: buyer.and_then(|b| b.id),
                buyer_name: buyer.and_then(|b| b.display_name()),
                order_status: translate_status(order.status.as_deref()),
                status_detail: order.status_detail.clone(),
                sold_at: order.date_created,
                order_updated_at: order.last_updated,
                closed_at: order.date_closed,
                total_amount: brl(order.total_amount),
                paid_amount: brl(order.paid_amount),
                currency: order.currency_id.clone(),
                sales_channel: Some(sales_channel(order)),
                payment_method: Some(translate_payment_method(payment.and_then(|p| p.payment_method_id.as_deref()))),
                payment_type: Some(translate_payment_type(payment.and_then(|p| p.payment_type.as_deref()))),
                installments,
                financing_fee: Some(financing_fee),
                installment_details: installment_details.clone(),
                approved_at: payment.and_then(|p| p.date_approved),
                ..NewSaleRecord::default()
            };
            shipping.apply_to(&mut record);
            cancellation.apply_to(&mut record);
            record
        })
        .collect()
}

fn sales_channel(order: &MercadoOrder) -> String {
    order.context.as_ref().and_then(|c| c.channel.clone()).unwrap_or_else(|| "marketplace".to_string())
}

//--------------------------------------        Packs          -------------------------------------------------------

/// A line item collected from a pack member order, carrying the member-order fields its
/// `pack_item` row needs.
#[derive(Debug, Clone)]
pub struct PackLineItem {
    pub order_id: Option<i64>,
    pub order_status: Option<String>,
    pub status_detail: Option<String>,
    pub sold_at: Option<DateTime<Utc>>,
    pub order_updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub currency: Option<String>,
    pub entry: OrderItemEntry,
}

impl PackLineItem {
    fn total(&self) -> Brl {
        brl(self.entry.unit_price).unwrap_or_default() * self.entry.quantity_or_one()
    }

    fn fee(&self) -> Brl {
        brl(self.entry.sale_fee).unwrap_or_default() * self.entry.quantity_or_one()
    }
}

/// Flattens the member orders into line items. Items without an item id are dropped; if that
/// leaves nothing, the caller treats the pack as failed.
pub fn collect_pack_items(members: &[MercadoOrder]) -> Vec<PackLineItem> {
    let mut items = Vec::new();
    for order in members {
        for entry in order.items() {
            if entry.item_id().is_none() {
                continue;
            }
            items.push(PackLineItem {
                order_id: order.id,
                order_status: order.status.clone(),
                status_detail: order.status_detail.clone(),
                sold_at: order.date_created,
                order_updated_at: order.last_updated,
                closed_at: order.date_closed,
                currency: order.currency_id.clone(),
                entry: entry.clone(),
            });
        }
    }
    items
}

/// One aggregate `pack` row followed by one `pack_item` row per collected line item.
///
/// The pack row takes its payment columns from the primary order's embedded payment; only the
/// financing fee prefers the separately fetched payment. Item rows carry order-level and
/// item-level fields only; shipping, payment and cancellation live on the pack row.
pub fn build_pack_records(
    pack_id: &str,
    primary: &MercadoOrder,
    fetched_payment: Option<&OrderPayment>,
    shipping: &ShippingFacts,
    cancellation: &CancellationFacts,
    items: &[PackLineItem],
) -> Vec<NewSaleRecord> {
    let embedded = primary.first_payment();
    let merged = fetched_payment.or(embedded);
    let buyer = primary.buyer.as_ref();
    let total: Brl = items.iter().map(PackLineItem::total).sum();
    let fees: Brl = items.iter().map(PackLineItem::fee).sum();
    let financing_fee = first_nonzero_brl(&[
        fetched_payment.and_then(|p| p.financing_fee_amount()),
        embedded.and_then(|p| p.financing_fee_amount()),
    ]);
    let total_paid = first_nonzero_brl(&[primary.paid_amount, merged.and_then(|p| p.total_paid_amount)]);
    let installment_details = describe_installments(merged.and_then(|p| p.installments), total_paid);

    let mut pack_row = NewSaleRecord {
        record_type: RecordType::Pack,
        pack_id: Some(pack_id.to_string()),
        order_id: None,
        item_id: None,
        is_pack: true,
        item_title: Some(format!("PACOTE - {} itens", items.len())),
        sku: None,
        quantity: Some(items.len() as i64),
        unit_price: None,
        marketplace_fee: Some(fees),
        listing_type: None,
        buyer_id: buyer.and_then(|b| b.id),
        buyer_name: buyer.and_then(|b| b.display_name()),
        order_status: translate_status(primary.status.as_deref()),
        status_detail: primary.status_detail.clone(),
        sold_at: primary.date_created,
        closed_at: primary.date_closed,
        total_amount: Some(total),
        currency: primary.currency_id.clone(),
        sales_channel: Some(sales_channel(primary)),
        payment_method: Some(translate_payment_method(embedded.and_then(|p| p.payment_method_id.as_deref()))),
        payment_type: Some(translate_payment_type(embedded.and_then(|p| p.payment_type.as_deref()))),
        installments: embedded.and_then(|p| p.installments),
        financing_fee: Some(financing_fee),
        installment_details,
        approved_at: embedded.and_then(|p| p.date_approved),
        ..NewSaleRecord::default()
    };
    shipping.apply_to(&mut pack_row);
    cancellation.apply_to(&mut pack_row);

    let mut records = Vec::with_capacity(items.len() + 1);
    records.push(pack_row);
    for item in items {
        let entry = &item.entry;
        records.push(NewSaleRecord {
            record_type: RecordType::PackItem,
            pack_id: Some(pack_id.to_string()),
            order_id: item.order_id,
            item_id: entry.item_id().map(String::from),
            is_pack: true,
            item_title: entry.title().map(String::from),
            sku: entry.sku().map(String::from),
            quantity: Some(entry.quantity_or_one()),
            unit_price: Some(brl(entry.unit_price).unwrap_or_default()),
            marketplace_fee: Some(item.fee()),
            listing_type: Some(translate_listing_type(entry.listing_type_id.as_deref())),
            buyer_id: buyer.and_then(|b| b.id),
            buyer_name: buyer.and_then(|b| b.display_name()),
            order_status: translate_status(item.order_status.as_deref()),
            status_detail: item.status_detail.clone(),
            sold_at: item.sold_at,
            order_updated_at: item.order_updated_at,
            closed_at: item.closed_at,
            total_amount: Some(item.total()),
            currency: item.currency.clone(),
            ..NewSaleRecord::default()
        });
    }
    records
}
