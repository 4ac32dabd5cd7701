mod api;
mod config;
mod error;
mod token;

mod data_objects;

pub use api::MercadoApi;
pub use config::{MercadoConfig, DEFAULT_MELI_API_URL};
pub use data_objects::{
    is_order_related,
    json_scalar_to_string,
    order_id_from_resource,
    Buyer,
    CancelDetail,
    Destination,
    EstimatedDelivery,
    FinancingFee,
    ItemInfo,
    LeadTime,
    Logistic,
    Mediation,
    MediationClaim,
    MediationRef,
    MercadoOrder,
    MissedFeedItem,
    NameOrString,
    NamedRef,
    OrderContext,
    OrderCosts,
    OrderItemEntry,
    OrderPayment,
    Pack,
    PackOrderRef,
    ReceiverAddress,
    Refund,
    Shipment,
    ShippingInfo,
    ShippingOption,
    StatusHistory,
};
pub use error::MercadoApiError;
pub use token::{TokenInfo, TokenProvider};
