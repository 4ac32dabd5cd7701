mod translate;

pub use translate::{
    attribute_cancellation,
    describe_installments,
    translate_listing_type,
    translate_payment_method,
    translate_payment_type,
    translate_status,
    who_pays_shipping,
};
