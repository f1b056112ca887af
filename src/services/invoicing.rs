use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::UserProfile,
    models::format_amount,
    services::{checkout::CheckoutSession, payments::Receipt},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub course_id: String,
    pub description: String,
    pub amount: Decimal,
    pub free: bool,
}

/// Printable record of a completed purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub receipt_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub billed_to: Option<String>,
    pub email: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub bundle_discount: Decimal,
    pub coupon_code: Option<String>,
    pub coupon_discount: Decimal,
    pub total: Decimal,
}

impl Invoice {
    pub fn new(checkout: &CheckoutSession, receipt: &Receipt, user: Option<&UserProfile>) -> Self {
        let summary = checkout.summary();
        let lines = checkout
            .courses()
            .iter()
            .map(|c| InvoiceLine {
                course_id: c.id.clone(),
                description: c.course_name.clone(),
                amount: c.payable_price(),
                free: c.is_free(),
            })
            .collect();

        Self {
            receipt_id: receipt.id,
            issued_at: receipt.issued_at,
            billed_to: user.map(UserProfile::full_name),
            email: user.map(|u| u.email.clone()),
            lines,
            subtotal: summary.original_price,
            bundle_discount: summary.bundle_discount,
            coupon_code: checkout.coupon().map(|c| c.code.clone()),
            coupon_discount: summary.coupon_discount,
            total: receipt.amount,
        }
    }

    /// Standalone HTML document for printing or saving.
    pub fn render_html(&self, currency_symbol: &str) -> String {
        let money = |amount: Decimal| escape_html(&format_amount(currency_symbol, amount));
        let mut html = String::with_capacity(2048);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>Invoice {}</title>", self.receipt_id);
        html.push_str("</head>\n<body>\n<h1>Invoice</h1>\n");
        let _ = writeln!(html, "<p>Receipt: {}</p>", self.receipt_id);
        let _ = writeln!(html, "<p>Date: {}</p>", self.issued_at.format("%d %b %Y"));
        if let Some(name) = &self.billed_to {
            let _ = writeln!(html, "<p>Billed to: {}</p>", escape_html(name));
        }
        if let Some(email) = &self.email {
            let _ = writeln!(html, "<p>Email: {}</p>", escape_html(email));
        }

        html.push_str("<table>\n<thead><tr><th>Course</th><th>Price</th></tr></thead>\n<tbody>\n");
        for line in &self.lines {
            let price = if line.free {
                "Free".to_string()
            } else {
                money(line.amount)
            };
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(&line.description),
                price
            );
        }
        html.push_str("</tbody>\n<tfoot>\n");
        let _ = writeln!(html, "<tr><td>Subtotal</td><td>{}</td></tr>", money(self.subtotal));
        if !self.bundle_discount.is_zero() {
            let _ = writeln!(
                html,
                "<tr><td>Bundle discount</td><td>-{}</td></tr>",
                money(self.bundle_discount)
            );
        }
        if let Some(code) = &self.coupon_code {
            let _ = writeln!(
                html,
                "<tr><td>Coupon {}</td><td>-{}</td></tr>",
                escape_html(code),
                money(self.coupon_discount)
            );
        }
        let _ = writeln!(html, "<tr><th>Total</th><th>{}</th></tr>", money(self.total));
        html.push_str("</tfoot>\n</table>\n</body>\n</html>\n");

        debug!(receipt_id = %self.receipt_id, bytes = html.len(), "invoice rendered");
        html
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
