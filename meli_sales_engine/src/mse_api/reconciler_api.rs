//! The reconciliation flow: one order or pack id in, denormalised ledger rows out.

use std::{collections::HashSet, fmt::Debug, time::Duration};

use log::*;
use mercado_tools::{MercadoOrder, Pack, Shipment};
use tokio::time::sleep;

use crate::{
    db_types::NewSaleRecord,
    mse_api::{
        errors::ReconciliationError,
        sale_builder::{
            build_individual_records,
            build_pack_records,
            collect_pack_items,
            extract_cancellation,
            extract_shipping,
            CancellationFacts,
        },
    },
    queue::TaskOutcome,
    traits::{OrderSource, SalesLedger},
};

/// `ReconcilerApi` turns marketplace order events into sales ledger rows.
///
/// All remote calls run sequentially with a fixed pause between successive calls. The pacing is
/// deliberate: the marketplace rate-limits aggressively, and a reconciliation chain for one order
/// can reach five or more endpoints. Concurrency is the queue's job, not this API's.
pub struct ReconcilerApi<B, S> {
    db: B,
    source: S,
    api_delay: Duration,
}

impl<B, S> Debug for ReconcilerApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcilerApi")
    }
}

impl<B, S> Clone for ReconcilerApi<B, S>
where
    B: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), source: self.source.clone(), api_delay: self.api_delay }
    }
}

impl<B, S> ReconcilerApi<B, S>
where
    B: SalesLedger,
    S: OrderSource,
{
    pub fn new(db: B, source: S, api_delay: Duration) -> Self {
        Self { db, source, api_delay }
    }

    async fn pace(&self) {
        sleep(self.api_delay).await;
    }

    /// Reconciles a single order.
    ///
    /// If the order belongs to a real pack (two or more distinct item/variation pairs across the
    /// pack's orders), the whole pack is reconciled instead and the result covers every member.
    /// Otherwise the order is standalone: its shipment and payment are fetched (paced, when the
    /// ids exist) and one row per line item is upserted.
    pub async fn process_order(&self, order_id: &str) -> Result<TaskOutcome, ReconciliationError> {
        info!("🛒️ Reconciling order {order_id}");
        let order = self.source.fetch_order(order_id).await?;
        if let Some(pack_id) = order.pack_id_string() {
            if self.verify_real_pack(&pack_id).await {
                info!("🛒️ Order {order_id} belongs to real pack {pack_id}. Reconciling the whole pack");
                return self.reconcile_pack(&pack_id, order).await;
            }
            info!("🛒️ Order {order_id} carries pack id {pack_id}, but it is not a real pack. Treating it as a single sale");
        }
        self.process_standalone_order(order).await
    }

    /// Reconciles a pack directly, using the pack's first member as the primary order.
    pub async fn process_pack(&self, pack_id: &str) -> Result<TaskOutcome, ReconciliationError> {
        info!("🛒️ Reconciling pack {pack_id}");
        let pack = self.source.fetch_pack(pack_id).await?;
        let primary_id = pack
            .orders()
            .first()
            .and_then(|o| o.id_string())
            .ok_or_else(|| ReconciliationError::EmptyPack(pack_id.to_string()))?;
        self.pace().await;
        let primary = self.source.fetch_order(&primary_id).await?;
        self.reconcile_pack_members(pack_id, &pack, primary).await
    }

    /// Whether a pack id refers to a real multi-item pack. The marketplace assigns pack ids to
    /// some single-item orders too; those are reconciled as ordinary sales.
    ///
    /// Any failure while counting comes back as `false`: a pack that cannot be verified is
    /// processed as a standalone order rather than failing the task.
    pub async fn verify_real_pack(&self, pack_id: &str) -> bool {
        match self.count_distinct_pack_items(pack_id).await {
            Ok(distinct) => {
                let real = distinct >= 2;
                info!("🛒️ Pack {pack_id} has {distinct} distinct item(s). Real pack: {real}");
                real
            },
            Err(e) => {
                warn!("🛒️ Could not verify pack {pack_id}: {e}. Treating it as not a real pack");
                false
            },
        }
    }

    async fn count_distinct_pack_items(&self, pack_id: &str) -> Result<usize, ReconciliationError> {
        let pack = self.source.fetch_pack(pack_id).await?;
        if pack.orders().is_empty() {
            warn!("🛒️ Pack {pack_id} has no member orders");
            return Ok(0);
        }
        let mut distinct = HashSet::new();
        for member in pack.orders() {
            let Some(member_id) = member.id_string() else {
                continue;
            };
            self.pace().await;
            let order = self.source.fetch_order(&member_id).await?;
            for entry in order.items() {
                let item_id = entry.item_id().unwrap_or("ID_INDISPONIVEL");
                let variation =
                    entry.variation_id().map(|v| v.to_string()).unwrap_or_else(|| "SEM_VARIACAO".to_string());
                distinct.insert(format!("{item_id}-{variation}"));
            }
        }
        Ok(distinct.len())
    }

    async fn process_standalone_order(&self, order: MercadoOrder) -> Result<TaskOutcome, ReconciliationError> {
        let label = order.id_string().unwrap_or_else(|| "?".to_string());
        let shipment = self.fetch_shipment_for(&order).await?;
        let payment = match order.first_payment().and_then(|p| p.id_string()) {
            Some(payment_id) => {
                self.pace().await;
                Some(self.source.fetch_payment(&payment_id).await?)
            },
            None => order.first_payment().cloned(),
        };
        let shipping = extract_shipping(shipment.as_ref(), &order, payment.as_ref());
        let mut cancellation = extract_cancellation(&order, payment.as_ref());
        self.resolve_claim_reason(&mut cancellation).await?;
        let records = build_individual_records(&order, payment.as_ref(), &shipping, &cancellation);
        debug!("🛒️ Order {label} produced {} ledger row(s)", records.len());
        self.upsert_all(records, format!("order {label}")).await
    }

    /// Reconciles a pack for which the triggering order has already been fetched. That order
    /// serves as the pack's primary order; the original pack member list still drives aggregation.
    async fn reconcile_pack(&self, pack_id: &str, primary: MercadoOrder) -> Result<TaskOutcome, ReconciliationError> {
        let pack = self.source.fetch_pack(pack_id).await?;
        if pack.orders().is_empty() {
            return Err(ReconciliationError::EmptyPack(pack_id.to_string()));
        }
        self.reconcile_pack_members(pack_id, &pack, primary).await
    }

    async fn reconcile_pack_members(
        &self,
        pack_id: &str,
        pack: &Pack,
        primary: MercadoOrder,
    ) -> Result<TaskOutcome, ReconciliationError> {
        let member_count = pack.orders().len();
        info!("🛒️ Pack {pack_id} lists {member_count} member order(s)");

        let fetched_payment = match primary.first_payment().and_then(|p| p.id_string()) {
            Some(payment_id) => {
                self.pace().await;
                Some(self.source.fetch_payment(&payment_id).await?)
            },
            None => None,
        };
        let shipment = self.fetch_shipment_for(&primary).await?;
        let merged_payment = fetched_payment.as_ref().or(primary.first_payment());
        let shipping = extract_shipping(shipment.as_ref(), &primary, merged_payment);
        let mut cancellation = extract_cancellation(&primary, merged_payment);
        self.resolve_claim_reason(&mut cancellation).await?;

        // All-or-nothing: every member order must be fetched and carry line items, otherwise no
        // rows are written and the task fails (and is retried by the queue).
        let mut collected = HashSet::new();
        let mut duplicates = 0usize;
        let mut failures: Vec<String> = Vec::new();
        let mut members: Vec<MercadoOrder> = Vec::new();
        for (i, member) in pack.orders().iter().enumerate() {
            let Some(member_id) = member.id_string() else {
                failures.push(format!("member #{i} has no order id"));
                continue;
            };
            if collected.contains(&member_id) {
                warn!("🛒️ Pack {pack_id} lists order {member_id} more than once. Skipping the duplicate");
                duplicates += 1;
                continue;
            }
            self.pace().await;
            match self.source.fetch_order(&member_id).await {
                Ok(order) if order.items().is_empty() => {
                    failures.push(format!("order {member_id} has no line items"));
                },
                Ok(order) => {
                    collected.insert(member_id);
                    members.push(order);
                },
                Err(e) => {
                    error!("🛒️ Failed to fetch pack member {member_id}: {e}");
                    failures.push(format!("order {member_id}: {e}"));
                },
            }
        }

        let items = collect_pack_items(&members);
        if !failures.is_empty() || collected.len() + duplicates != member_count || items.is_empty() {
            let detail = format!(
                "{}/{member_count} member orders collected, {} error(s), {} line item(s)",
                collected.len(),
                failures.len(),
                items.len()
            );
            error!("🛒️ Pack {pack_id} failed: {detail}");
            return Err(ReconciliationError::PackIncomplete { pack_id: pack_id.to_string(), detail });
        }

        let records = build_pack_records(pack_id, &primary, fetched_payment.as_ref(), &shipping, &cancellation, &items);
        self.upsert_all(records, format!("pack {pack_id}")).await
    }

    async fn fetch_shipment_for(&self, order: &MercadoOrder) -> Result<Option<Shipment>, ReconciliationError> {
        match order.shipping.as_ref().and_then(|s| s.id_string()) {
            Some(shipment_id) => {
                self.pace().await;
                Ok(Some(self.source.fetch_shipment(&shipment_id).await?))
            },
            None => Ok(None),
        }
    }

    /// Fetches the mediation reason for the claim recorded on the facts, if there is one.
    async fn resolve_claim_reason(&self, cancellation: &mut CancellationFacts) -> Result<(), ReconciliationError> {
        if let Some(claim_id) = cancellation.claim_id {
            self.pace().await;
            let mediation = self.source.fetch_mediation(&claim_id.to_string()).await?;
            cancellation.claim_reason = mediation.first_reason().map(String::from);
        }
        Ok(())
    }

    async fn upsert_all(
        &self,
        records: Vec<NewSaleRecord>,
        target: String,
    ) -> Result<TaskOutcome, ReconciliationError> {
        let count = records.len();
        for record in records {
            self.db.upsert_sale_record(record).await?;
        }
        info!("🧾️ {target} reconciled. {count} ledger row(s) written");
        Ok(TaskOutcome::new(&target, count, format!("{count} ledger row(s) written")))
    }
}
