use std::future::Future;

use mercado_tools::{
    MercadoApi, MercadoApiError, MercadoOrder, Mediation, MissedFeedItem, OrderPayment, Pack, Shipment, TokenProvider,
};

/// The remote order data source.
///
/// This is the seam between the reconciliation engine and the marketplace's REST API. The production implementation
/// is [`MercadoApi`]; integration tests substitute a scripted source so that whole reconciliation flows run without
/// network access.
///
/// The returned futures must be `Send` because task handlers run on the queue dispatcher's spawned task.
pub trait OrderSource: Clone + Send + Sync + 'static {
    fn fetch_order(&self, order_id: &str) -> impl Future<Output = Result<MercadoOrder, MercadoApiError>> + Send;

    fn fetch_shipment(&self, shipment_id: &str) -> impl Future<Output = Result<Shipment, MercadoApiError>> + Send;

    fn fetch_payment(&self, payment_id: &str) -> impl Future<Output = Result<OrderPayment, MercadoApiError>> + Send;

    fn fetch_pack(&self, pack_id: &str) -> impl Future<Output = Result<Pack, MercadoApiError>> + Send;

    fn fetch_mediation(&self, mediation_id: &str) -> impl Future<Output = Result<Mediation, MercadoApiError>> + Send;

    fn fetch_missed_feeds(
        &self,
        app_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<MissedFeedItem>, MercadoApiError>> + Send;
}

impl<T: TokenProvider> OrderSource for MercadoApi<T> {
    async fn fetch_order(&self, order_id: &str) -> Result<MercadoOrder, MercadoApiError> {
        MercadoApi::fetch_order(self, order_id).await
    }

    async fn fetch_shipment(&self, shipment_id: &str) -> Result<Shipment, MercadoApiError> {
        MercadoApi::fetch_shipment(self, shipment_id).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<OrderPayment, MercadoApiError> {
        MercadoApi::fetch_payment(self, payment_id).await
    }

    async fn fetch_pack(&self, pack_id: &str) -> Result<Pack, MercadoApiError> {
        MercadoApi::fetch_pack(self, pack_id).await
    }

    async fn fetch_mediation(&self, mediation_id: &str) -> Result<Mediation, MercadoApiError> {
        MercadoApi::fetch_mediation(self, mediation_id).await
    }

    async fn fetch_missed_feeds(&self, app_id: &str, user_id: &str) -> Result<Vec<MissedFeedItem>, MercadoApiError> {
        MercadoApi::fetch_missed_feeds(self, app_id, user_id).await
    }
}
