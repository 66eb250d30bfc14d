//! Receipt

use std::io;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, OrderInstructions},
    coupons::AppliedCoupon,
    delivery::DeliveryQuote,
    geo::DistanceSource,
    pricing::{PriceBreakdown, PricingError},
    session::{OrderSession, SessionError},
};

const GREY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A line total could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The order could not be priced.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// A single receipt row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine<'a> {
    /// Dish name
    pub dish_name: String,

    /// Portions ordered
    pub quantity: u32,

    /// Price of one portion
    pub unit_price: Money<'a, Currency>,

    /// Unit price times quantity
    pub line_total: Money<'a, Currency>,
}

/// Printable summary of an order.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: SmallVec<[ReceiptLine<'a>; 8]>,
    breakdown: PriceBreakdown<'a>,
    coupon: Option<AppliedCoupon<'a>>,
    instructions: OrderInstructions,
    distance_km: Option<f64>,
}

impl<'a> Receipt<'a> {
    /// Build a receipt for `cart` priced as `breakdown`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if a line total overflows.
    pub fn new(cart: &Cart<'a>, breakdown: PriceBreakdown<'a>) -> Result<Self, ReceiptError> {
        let lines = cart
            .items()
            .iter()
            .map(|item| -> Result<ReceiptLine<'a>, ReceiptError> {
                Ok(ReceiptLine {
                    dish_name: item.dish_name().to_string(),
                    quantity: item.quantity(),
                    unit_price: *item.unit_price(),
                    line_total: item.line_total()?,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            lines,
            breakdown,
            coupon: cart.coupon().cloned(),
            instructions: cart.instructions().clone(),
            distance_km: None,
        })
    }

    /// Build a receipt for the current state of `session`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the session cannot be priced.
    pub fn from_session<S: DistanceSource>(
        session: &OrderSession<'a, S>,
    ) -> Result<Self, ReceiptError> {
        let receipt = Self::new(session.cart(), session.breakdown()?)?;

        Ok(receipt.with_delivery(session.delivery()))
    }

    /// Show the distance the delivery fee was quoted for.
    #[must_use]
    pub fn with_delivery(mut self, quote: &DeliveryQuote<'_>) -> Self {
        self.distance_km = quote.distance_km;
        self
    }

    /// Receipt rows in cart order.
    pub fn lines(&self) -> &[ReceiptLine<'a>] {
        &self.lines
    }

    /// Price breakdown the receipt was built from.
    pub fn breakdown(&self) -> &PriceBreakdown<'a> {
        &self.breakdown
    }

    /// Writes the receipt table and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Dish", "Qty", "Price", "Total"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.dish_name.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.line_total.to_string(),
            ]);
        }

        write_receipt_table(&mut out, builder)?;
        write_receipt_summary(&mut out, self)?;
        write_receipt_notes(&mut out, self)
    }
}

fn write_receipt_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    let table_str = grey_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    receipt: &Receipt<'_>,
) -> Result<(), ReceiptError> {
    let breakdown = &receipt.breakdown;

    let delivery_label = match receipt.distance_km {
        Some(km) => format!(" Delivery ({km:.1} km):"),
        None => " Delivery:".to_string(),
    };

    let discount_label = match receipt.coupon.as_ref().filter(|c| c.is_applied()) {
        Some(coupon) => format!(" Discount ({}):", coupon.code()),
        None => " Discount:".to_string(),
    };

    let mut rows: SmallVec<[(String, String); 8]> = SmallVec::new();

    rows.push((" Subtotal:".to_string(), format!("{}  ", breakdown.subtotal)));
    rows.push((delivery_label, format!("{}  ", breakdown.delivery)));
    rows.push((" Platform fee:".to_string(), format!("{}  ", breakdown.platform_fee)));
    rows.push((
        " GST and charges:".to_string(),
        format!("{}  ", breakdown.taxes_and_charges),
    ));

    if breakdown.tip.to_minor_units() > 0 {
        rows.push((" Tip:".to_string(), format!("{}  ", breakdown.tip)));
    }

    if breakdown.discount.to_minor_units() > 0 {
        rows.push((discount_label, format!("-{}  ", breakdown.discount)));
    }

    let total_label = format!(" {BOLD}Total:{RESET}");
    let total_val = format!("{}  ", breakdown.total);

    let label_width = rows
        .iter()
        .map(|(label, _)| display_width(label))
        .chain([display_width(&total_label)])
        .max()
        .unwrap_or_default();

    let value_width = rows
        .iter()
        .map(|(_, value)| display_width(value))
        .chain([display_width(&total_val)])
        .max()
        .unwrap_or_default();

    for (label, value) in &rows {
        write_summary_row(out, (label, value), (label_width, value_width))?;
    }

    write_summary_row(
        out,
        (&total_label, &format!("{BOLD}{total_val}{RESET}")),
        (label_width, value_width),
    )?;

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

fn write_receipt_notes(
    out: &mut impl io::Write,
    receipt: &Receipt<'_>,
) -> Result<(), ReceiptError> {
    let mut notes: SmallVec<[String; 4]> = SmallVec::new();

    if let Some(message) = receipt.coupon.as_ref().and_then(AppliedCoupon::error_message) {
        notes.push(format!("Coupon: {message}"));
    }

    if let Some(cooking) = &receipt.instructions.cooking_instructions {
        notes.push(format!("Kitchen: {cooking}"));
    }

    if let Some(delivery) = &receipt.instructions.delivery_instructions {
        notes.push(format!("Courier: {delivery}"));
    }

    if !receipt.instructions.send_cutlery {
        notes.push("No cutlery".to_string());
    }

    if receipt.breakdown.clamped {
        notes.push("Discount exceeds the order value; total floored at zero".to_string());
    }

    for note in notes {
        writeln!(out, " {GREY}{note}{RESET}").map_err(|_err| ReceiptError::IO)?;
    }

    Ok(())
}

fn is_box_drawing(ch: char) -> bool {
    matches!(ch, '\u{2500}'..='\u{257F}')
}

/// Dims each run of box-drawing characters in the rendered table.
fn grey_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len());
    let mut chars = table.chars().peekable();

    while let Some(ch) = chars.next() {
        if !is_box_drawing(ch) {
            out.push(ch);
            continue;
        }

        out.push_str(GREY);
        out.push(ch);

        while let Some(next) = chars.next_if(|next| is_box_drawing(*next)) {
            out.push(next);
        }

        out.push_str(RESET);
    }

    out
}

/// Printed width of `text`, not counting ANSI escape sequences.
fn display_width(text: &str) -> usize {
    text.split('\x1b')
        .enumerate()
        .map(|(idx, part)| {
            if idx == 0 {
                part.chars().count()
            } else {
                part.chars()
                    .skip_while(|ch| !ch.is_ascii_alphabetic())
                    .skip(1)
                    .count()
            }
        })
        .sum()
}

/// Right-aligns `label` and `value` into their columns.
fn write_summary_row(
    out: &mut impl io::Write,
    (label, value): (&str, &str),
    (label_width, value_width): (usize, usize),
) -> Result<(), ReceiptError> {
    let indent = " ".repeat(label_width.saturating_sub(display_width(label)));
    let gap = " ".repeat(
        value_width
            .saturating_sub(display_width(value))
            .saturating_add(2),
    );

    writeln!(out, "{indent}{label}{gap}{value}").map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::INR;
    use testresult::TestResult;

    use super::*;
    use crate::{
        cart::NewDish,
        config::PricingConfig,
        coupons::CouponBook,
        geo::GeoPoint,
        pricing::Charges,
    };

    fn inr(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, INR)
    }

    fn render(receipt: &Receipt<'_>) -> Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn lines_follow_the_cart() -> TestResult {
        let mut cart = Cart::new(INR);
        let naan = NewDish::new("d1", "Butter Naan", inr(4_000), "img");

        cart.add_item("r1".into(), &naan)?;
        cart.add_item("r1".into(), &naan)?;

        let zero = inr(0);
        let breakdown = cart.price(&Charges {
            delivery: zero,
            platform_fee: zero,
            taxes_and_charges: zero,
            tip: zero,
        })?;
        let receipt = Receipt::new(&cart, breakdown)?;

        assert_eq!(
            receipt.lines(),
            [ReceiptLine {
                dish_name: "Butter Naan".to_string(),
                quantity: 2,
                unit_price: inr(4_000),
                line_total: inr(8_000),
            }]
        );
        assert_eq!(receipt.breakdown().total, inr(8_000));

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_summary_and_notes() -> TestResult {
        let mut session = OrderSession::new(PricingConfig::default(), CouponBook::standard(INR));

        session.add_item("r1".into(), &NewDish::new("d1", "Veg Thali", inr(25_000), "img"))?;
        session.update_locations(GeoPoint::new(12.97, 77.59), GeoPoint::new(12.97, 77.59));
        session.apply_coupon("save10")?;
        session.set_instructions(Some("no onions".to_string()), None);
        session.toggle_cutlery();

        let output = render(&Receipt::from_session(&session)?)?;

        assert!(output.contains("Veg Thali"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Delivery (0.0 km):"));
        assert!(output.contains("Discount (SAVE10):"));
        assert!(output.contains("Total:"));
        assert!(output.contains("Kitchen: no onions"));
        assert!(output.contains("No cutlery"));
        assert!(!output.contains("Tip:"));

        Ok(())
    }

    #[test]
    fn write_to_reports_rejected_coupon() -> TestResult {
        let mut session = OrderSession::new(PricingConfig::default(), CouponBook::standard(INR));

        session.add_item("r1".into(), &NewDish::new("d1", "Chai", inr(2_000), "img"))?;
        session.apply_coupon("XYZ")?;

        let output = render(&Receipt::from_session(&session)?)?;

        assert!(output.contains("Coupon: Invalid coupon code"));
        assert!(output.contains(" Delivery:"));
        assert!(!output.contains("Discount"));

        Ok(())
    }

    #[test]
    fn escape_sequences_take_no_width() {
        assert_eq!(display_width(&format!("{BOLD}Total:{RESET}")), 6);
        assert_eq!(display_width("₹80.50"), 6);
    }

    #[test]
    fn borders_are_dimmed_per_run() {
        assert_eq!(
            grey_borders("╭──╮\n│a│"),
            format!("{GREY}╭──╮{RESET}\n{GREY}│{RESET}a{GREY}│{RESET}")
        );
    }
}
