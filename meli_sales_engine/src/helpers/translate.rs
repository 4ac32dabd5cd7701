//! Portuguese rendering of the marketplace vocabulary.
//!
//! Downstream consumers of the sales ledger are spreadsheets and dashboards read by
//! Brazilian sellers, so raw API statuses are translated at write time. Every table
//! falls back to the raw value, capitalized, so new vocabulary still surfaces instead
//! of disappearing into a NULL.

use msp_common::{helpers::capitalize, Brl};

/// Translates an order or shipment status. Underscores are treated as spaces and the
/// lookup is case-insensitive; unknown statuses come back capitalized but otherwise
/// untouched.
pub fn translate_status(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let normalized = raw.to_lowercase().replace('_', " ");
    let translated = match normalized.as_str() {
        "paid" => "Pago",
        "confirmed" => "Confirmado",
        "cancelled" => "Cancelado",
        "approved" => "Aprovado",
        "rejected" => "Rejeitado",
        "in process" => "Em Processamento",
        "pending" => "Pendente",
        "refunded" => "Reembolsado",
        "handling" => "Preparando Envio",
        "ready to ship" => "Pronto para Enviar",
        "shipped" => "Enviado",
        "delivered" => "Entregue",
        "not delivered" => "Não Entregue",
        "to be agreed" => "A Combinar",
        "in warehouse" => "No depósito",
        "creating route" => "Criando Rota",
        "ready for pickup" => "Pronto para Coleta (Transportadora)",
        "on its way" => "A Caminho",
        "out for delivery" => "Saiu para Entrega",
        "available for pickup" => "Disponível para Retirada (Agência)",
        "soon to be delivered" => "Chegando em Breve",
        "claimed" => "Destinatário não encontrado",
        "not delivered yet" => "Ainda não entregue",
        "returning to sender" => "Retornando ao remetente",
        "stolen" => "Extraviado/Roubado",
        _ => return Some(capitalize(raw)),
    };
    Some(translated.to_string())
}

pub fn translate_payment_method(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Não informado".to_string();
    };
    let translated = match raw.to_lowercase().as_str() {
        "credit_card" => "Cartão de Crédito",
        "debit_card" => "Cartão de Débito",
        "ticket" => "Boleto Bancário",
        "account_money" => "Dinheiro em Conta (Mercado Pago)",
        "digital_currency" => "Mercado Crédito",
        "bank_transfer" => "Transferência Bancária",
        "pix" => "PIX",
        _ => return capitalize(raw),
    };
    translated.to_string()
}

pub fn translate_payment_type(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Não informado".to_string();
    };
    let translated = match raw.to_lowercase().as_str() {
        "credit_card" => "Cartão de Crédito",
        "account_money" => "Dinheiro em Conta",
        "digital_currency" => "Moeda Digital",
        _ => return capitalize(raw),
    };
    translated.to_string()
}

pub fn translate_listing_type(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Não informado".to_string();
    };
    let translated = match raw.to_lowercase().as_str() {
        "gold_pro" => "Premium",
        "gold_special" => "Clássico",
        "gold_premium" => "Premium",
        _ => return capitalize(raw),
    };
    translated.to_string()
}

/// Names the party that cancelled an order, refining the raw `cancelled_by` field with
/// the cancellation reason and the order's status detail.
///
/// The special cases encode support-team conventions: unpaid orders cancelled by the
/// platform's automation are reported as lack of payment, fraud reasons win over the
/// raw canceller, and a seller cancelling for stock is called out explicitly. An
/// `expired` status detail is appended unless the label already mentions payment.
pub fn attribute_cancellation(
    cancelled_by: Option<&str>,
    reason: Option<&str>,
    status_detail: Option<&str>,
) -> String {
    let cancelled_by = cancelled_by.unwrap_or_default().to_lowercase();
    let reason = reason.unwrap_or_default().to_lowercase();

    let mut label = match cancelled_by.as_str() {
        "buyer" => "Comprador".to_string(),
        "seller" => "Vendedor".to_string(),
        "meli" | "mercadolibre" | "ml" => "Mercado Livre".to_string(),
        "admin" => "Mercado Livre (Administração)".to_string(),
        "system" | "automatic" => "Sistema".to_string(),
        other => capitalize(other),
    };

    if reason.contains("payment") || reason.contains("expired") {
        if matches!(cancelled_by.as_str(), "system" | "automatic" | "meli" | "ml") {
            label = "Mercado Livre (Falta de Pagamento)".to_string();
        }
    } else if reason.contains("fraud") {
        label = "Mercado Livre (Fraude Detectada)".to_string();
    } else if reason.contains("stock") && cancelled_by == "seller" {
        label = "Vendedor (Sem Estoque)".to_string();
    }

    let expired = status_detail.map(|s| s.to_lowercase().contains("expired")).unwrap_or(false);
    if expired && !label.contains("Pagamento") {
        label.push_str(" (Prazo Expirado)");
    }
    label
}

/// Renders an installment plan as `"3x de R$ 43,30"`, or `"À vista (R$ 129,90)"` for a
/// single installment. Returns `None` when nothing was paid.
pub fn describe_installments(installments: Option<i64>, total_paid: Brl) -> Option<String> {
    let n = installments.filter(|n| *n != 0).unwrap_or(1);
    if n > 1 && total_paid.value() > 0 {
        Some(format!("{n}x de {}", total_paid.split(n)))
    } else if n == 1 && total_paid.value() > 0 {
        Some(format!("À vista ({total_paid})"))
    } else {
        None
    }
}

/// Classifies who carries the shipping cost from the shipment's cost type and the
/// seller-side fee/subsidy split. `raw_status` is the untranslated shipment status.
pub fn who_pays_shipping(cost_type: &str, seller_cost: Brl, subsidy: Brl, raw_status: Option<&str>) -> String {
    let label = match cost_type {
        "not_free_shipping" => "Comprador",
        "free_shipping" => {
            if seller_cost.value() > 0 && subsidy.is_zero() {
                "Vendedor"
            } else if seller_cost.value() > 0 && subsidy.value() > 0 {
                "Compartilhado"
            } else if seller_cost.is_zero() && subsidy.value() > 0 {
                "Mercado Livre"
            } else {
                "Vendedor (Frete Grátis)"
            }
        },
        _ if raw_status == Some("to_be_agreed") => "A Combinar",
        _ => "Não Determinado",
    };
    label.to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn statuses_translate_with_underscore_normalisation() {
        assert_eq!(translate_status(Some("paid")).unwrap(), "Pago");
        assert_eq!(translate_status(Some("ready_to_ship")).unwrap(), "Pronto para Enviar");
        assert_eq!(translate_status(Some("OUT_FOR_DELIVERY")).unwrap(), "Saiu para Entrega");
        assert_eq!(translate_status(Some("to be agreed")).unwrap(), "A Combinar");
        assert_eq!(translate_status(Some("stolen")).unwrap(), "Extraviado/Roubado");
        assert_eq!(translate_status(None), None);
    }

    #[test]
    fn unknown_statuses_are_capitalized_untouched() {
        // The fallback keeps the raw spelling, underscores included.
        assert_eq!(translate_status(Some("weird_new_status")).unwrap(), "Weird_new_status");
        assert_eq!(translate_status(Some("Mystery")).unwrap(), "Mystery");
    }

    #[test]
    fn payment_methods_translate() {
        assert_eq!(translate_payment_method(Some("pix")), "PIX");
        assert_eq!(translate_payment_method(Some("credit_card")), "Cartão de Crédito");
        assert_eq!(translate_payment_method(Some("ticket")), "Boleto Bancário");
        assert_eq!(translate_payment_method(Some("account_money")), "Dinheiro em Conta (Mercado Pago)");
        assert_eq!(translate_payment_method(Some("paypal")), "Paypal");
        assert_eq!(translate_payment_method(None), "Não informado");
    }

    #[test]
    fn payment_and_listing_types_translate() {
        assert_eq!(translate_payment_type(Some("account_money")), "Dinheiro em Conta");
        assert_eq!(translate_payment_type(Some("digital_currency")), "Moeda Digital");
        assert_eq!(translate_payment_type(None), "Não informado");
        assert_eq!(translate_listing_type(Some("gold_special")), "Clássico");
        assert_eq!(translate_listing_type(Some("gold_pro")), "Premium");
        assert_eq!(translate_listing_type(Some("gold_premium")), "Premium");
        assert_eq!(translate_listing_type(Some("free")), "Free");
    }

    #[test]
    fn cancellation_attribution_basic_translations() {
        assert_eq!(attribute_cancellation(Some("buyer"), None, None), "Comprador");
        assert_eq!(attribute_cancellation(Some("seller"), None, None), "Vendedor");
        assert_eq!(attribute_cancellation(Some("meli"), None, None), "Mercado Livre");
        assert_eq!(attribute_cancellation(Some("admin"), None, None), "Mercado Livre (Administração)");
        assert_eq!(attribute_cancellation(Some("system"), None, None), "Sistema");
        assert_eq!(attribute_cancellation(Some("ops_team"), None, None), "Ops_team");
    }

    #[test]
    fn unpaid_cancellations_by_the_platform_are_called_out() {
        let label = attribute_cancellation(Some("system"), Some("payment_timeout"), None);
        assert_eq!(label, "Mercado Livre (Falta de Pagamento)");
        let label = attribute_cancellation(Some("ml"), Some("order expired"), None);
        assert_eq!(label, "Mercado Livre (Falta de Pagamento)");
        // A buyer cancelling over a payment problem keeps the plain attribution.
        let label = attribute_cancellation(Some("buyer"), Some("payment declined"), None);
        assert_eq!(label, "Comprador");
    }

    #[test]
    fn fraud_and_stock_overrides() {
        assert_eq!(
            attribute_cancellation(Some("buyer"), Some("suspected fraud"), None),
            "Mercado Livre (Fraude Detectada)"
        );
        assert_eq!(
            attribute_cancellation(Some("seller"), Some("out_of_stock"), None),
            "Vendedor (Sem Estoque)"
        );
        // The stock override only applies to the seller.
        assert_eq!(attribute_cancellation(Some("buyer"), Some("out_of_stock"), None), "Comprador");
    }

    #[test]
    fn expired_status_detail_is_appended_once() {
        assert_eq!(
            attribute_cancellation(Some("buyer"), None, Some("expired")),
            "Comprador (Prazo Expirado)"
        );
        // Already a payment label, nothing appended.
        assert_eq!(
            attribute_cancellation(Some("system"), Some("expired"), Some("expired")),
            "Mercado Livre (Falta de Pagamento)"
        );
    }

    #[test]
    fn installment_descriptions() {
        assert_eq!(describe_installments(Some(3), Brl::from(12990)).unwrap(), "3x de R$ 43,30");
        assert_eq!(describe_installments(Some(1), Brl::from(12990)).unwrap(), "À vista (R$ 129,90)");
        assert_eq!(describe_installments(None, Brl::from(5000)).unwrap(), "À vista (R$ 50,00)");
        assert_eq!(describe_installments(Some(0), Brl::from(5000)).unwrap(), "À vista (R$ 50,00)");
        assert_eq!(describe_installments(Some(3), Brl::default()), None);
        assert_eq!(describe_installments(Some(10), Brl::from(100000)).unwrap(), "10x de R$ 100,00");
    }

    #[test]
    fn shipping_payer_classification() {
        let zero = Brl::default();
        let some = Brl::from(1500);
        assert_eq!(who_pays_shipping("not_free_shipping", zero, zero, None), "Comprador");
        assert_eq!(who_pays_shipping("free_shipping", some, zero, None), "Vendedor");
        assert_eq!(who_pays_shipping("free_shipping", some, some, None), "Compartilhado");
        assert_eq!(who_pays_shipping("free_shipping", zero, some, None), "Mercado Livre");
        assert_eq!(who_pays_shipping("free_shipping", zero, zero, None), "Vendedor (Frete Grátis)");
        assert_eq!(who_pays_shipping("não informado", zero, zero, Some("to_be_agreed")), "A Combinar");
        assert_eq!(who_pays_shipping("não informado", zero, zero, Some("pending")), "Não Determinado");
        assert_eq!(who_pays_shipping("não informado", zero, zero, None), "Não Determinado");
    }
}
