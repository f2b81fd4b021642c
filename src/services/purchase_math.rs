//! Purchase bill money computation
//!
//! Deterministic integer arithmetic for bill posting: line amounts,
//! bill-level discount, VAT on the vatable share, and round-off to the
//! nearest rupee. All amounts are paisa (i64); percentages are basis
//! points so no floats enter the computation.

use thiserror::Error;

use crate::repos::purchase_repo::BillMoney;

/// Errors that can occur during bill money computation
#[derive(Debug, Error, PartialEq)]
pub enum MathError {
    #[error("Empty bill lines: cannot compute money from empty line set")]
    EmptyLines,

    #[error("Amount overflow while computing bill money")]
    AmountOverflow,
}

/// Input line for money computation
///
/// A simplified view of bill lines that only includes the fields needed
/// for the money calculation.
#[derive(Debug, Clone)]
pub struct LineInput {
    pub qty: i64,
    pub rate_minor: i64,
    pub is_vatable: bool,
}

/// Result of the bill money computation
#[derive(Debug, Clone, PartialEq)]
pub struct BillComputation {
    /// Per-line amounts (qty * rate), parallel to the input lines
    pub line_amounts_minor: Vec<i64>,
    pub money: BillMoney,
}

/// Convert decimal rupees from a request payload to integer paisa
pub fn to_minor(rupees: f64) -> i64 {
    (rupees * 100.0).round() as i64
}

/// Convert a percentage (e.g. 13.0) to basis points (1300)
pub fn pct_to_bp(pct: f64) -> i32 {
    (pct * 100.0).round() as i32
}

/// Apply a basis-point rate to an amount, rounding half-up.
///
/// Intermediate math runs in i128 so bp products cannot overflow.
fn apply_bp(amount_minor: i64, bp: i32) -> Result<i64, MathError> {
    let product = amount_minor as i128 * bp as i128;
    let rounded = (product + 5_000) / 10_000;
    i64::try_from(rounded).map_err(|_| MathError::AmountOverflow)
}

/// Round a total to the nearest rupee (100 paisa), half-up.
///
/// Returns (grand_total, round_off) where round_off is the signed
/// remainder added to reach the rounded figure.
fn round_to_rupee(total_minor: i64) -> (i64, i64) {
    let remainder = total_minor.rem_euclid(100);
    if remainder == 0 {
        (total_minor, 0)
    } else if remainder >= 50 {
        let round_off = 100 - remainder;
        (total_minor + round_off, round_off)
    } else {
        (total_minor - remainder, -remainder)
    }
}

/// Compute the money fields of a purchase bill
///
/// # Computation
///
/// 1. `amount = qty * rate` per line; `sub_total` is their sum
/// 2. `discount = sub_total * discount_pct_bp` (half-up)
/// 3. `taxable = sub_total - discount` (the discounted base)
/// 4. VAT applies to the vatable lines' share of the discounted base:
///    the discount is allocated against the vatable subtotal at the same
///    rate, and `vat = vatable_base * vat_rate_bp` (half-up). A
///    VAT-exempt bill always carries zero VAT.
/// 5. `taxable + vat` is rounded to the nearest rupee; the signed
///    remainder becomes `round_off` and the rounded figure `grand_total`
///
/// The fields always reconcile: `taxable + vat + round_off == grand_total`.
///
/// # Errors
///
/// * `MathError::EmptyLines` - if `lines` is empty
/// * `MathError::AmountOverflow` - if any intermediate exceeds i64
pub fn compute_bill_money(
    lines: &[LineInput],
    discount_pct_bp: i32,
    vat_rate_bp: i32,
    vat_exempt: bool,
) -> Result<BillComputation, MathError> {
    if lines.is_empty() {
        return Err(MathError::EmptyLines);
    }

    let mut line_amounts_minor = Vec::with_capacity(lines.len());
    let mut sub_total_minor: i64 = 0;
    let mut vatable_sub_minor: i64 = 0;

    for line in lines {
        let amount = line
            .qty
            .checked_mul(line.rate_minor)
            .ok_or(MathError::AmountOverflow)?;
        sub_total_minor = sub_total_minor
            .checked_add(amount)
            .ok_or(MathError::AmountOverflow)?;
        if line.is_vatable {
            vatable_sub_minor = vatable_sub_minor
                .checked_add(amount)
                .ok_or(MathError::AmountOverflow)?;
        }
        line_amounts_minor.push(amount);
    }

    let discount_minor = apply_bp(sub_total_minor, discount_pct_bp)?;
    let taxable_minor = sub_total_minor - discount_minor;

    let vat_minor = if vat_exempt {
        0
    } else {
        let vatable_discount = apply_bp(vatable_sub_minor, discount_pct_bp)?;
        let vatable_base = vatable_sub_minor - vatable_discount;
        apply_bp(vatable_base, vat_rate_bp)?
    };

    let before_round = taxable_minor
        .checked_add(vat_minor)
        .ok_or(MathError::AmountOverflow)?;
    let (grand_total_minor, round_off_minor) = round_to_rupee(before_round);

    Ok(BillComputation {
        line_amounts_minor,
        money: BillMoney {
            sub_total_minor,
            discount_minor,
            taxable_minor,
            vat_minor,
            round_off_minor,
            grand_total_minor,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vatable(qty: i64, rate_minor: i64) -> LineInput {
        LineInput { qty, rate_minor, is_vatable: true }
    }

    fn exempt(qty: i64, rate_minor: i64) -> LineInput {
        LineInput { qty, rate_minor, is_vatable: false }
    }

    #[test]
    fn test_to_minor_conversions() {
        assert_eq!(to_minor(25.5), 2550);
        assert_eq!(to_minor(0.0), 0);
        assert_eq!(to_minor(120.0), 12000);
        assert_eq!(to_minor(99.999), 10000);
        assert_eq!(to_minor(0.005), 1);
    }

    #[test]
    fn test_pct_to_bp_conversions() {
        assert_eq!(pct_to_bp(13.0), 1300);
        assert_eq!(pct_to_bp(5.0), 500);
        assert_eq!(pct_to_bp(0.0), 0);
        assert_eq!(pct_to_bp(2.5), 250);
        assert_eq!(pct_to_bp(100.0), 10000);
    }

    #[test]
    fn test_simple_bill_no_discount_no_vat() {
        let lines = vec![exempt(10, 2550), exempt(3, 12000)];
        let c = compute_bill_money(&lines, 0, 1300, false).unwrap();

        assert_eq!(c.line_amounts_minor, vec![25500, 36000]);
        assert_eq!(c.money.sub_total_minor, 61500);
        assert_eq!(c.money.discount_minor, 0);
        assert_eq!(c.money.taxable_minor, 61500);
        assert_eq!(c.money.vat_minor, 0);
        assert_eq!(c.money.round_off_minor, 0);
        assert_eq!(c.money.grand_total_minor, 61500);
    }

    #[test]
    fn test_all_vatable_no_discount() {
        // 10 * Rs 100 = 1000.00, VAT 13% = 130.00, total 1130.00 (round)
        let lines = vec![vatable(10, 10000)];
        let c = compute_bill_money(&lines, 0, 1300, false).unwrap();

        assert_eq!(c.money.sub_total_minor, 100_000);
        assert_eq!(c.money.taxable_minor, 100_000);
        assert_eq!(c.money.vat_minor, 13_000);
        assert_eq!(c.money.round_off_minor, 0);
        assert_eq!(c.money.grand_total_minor, 113_000);
    }

    #[test]
    fn test_mixed_bill_with_discount_and_round_off() {
        // 10 * 25.50 vatable + 3 * 120.00 exempt, 5% discount, 13% VAT:
        //   sub_total 615.00, discount 30.75, taxable 584.25
        //   vatable base 255.00 - 12.75 = 242.25, VAT 31.49 (31.4925 rounded)
        //   584.25 + 31.49 = 615.74 -> rounds up to 616.00, round_off +0.26
        let lines = vec![vatable(10, 2550), exempt(3, 12000)];
        let c = compute_bill_money(&lines, 500, 1300, false).unwrap();

        assert_eq!(c.money.sub_total_minor, 61500);
        assert_eq!(c.money.discount_minor, 3075);
        assert_eq!(c.money.taxable_minor, 58425);
        assert_eq!(c.money.vat_minor, 3149);
        assert_eq!(c.money.round_off_minor, 26);
        assert_eq!(c.money.grand_total_minor, 61600);
    }

    #[test]
    fn test_round_off_down() {
        // 3 * 10.10 = 30.30 -> rounds down to 30.00, round_off -0.30
        let lines = vec![exempt(3, 1010)];
        let c = compute_bill_money(&lines, 0, 1300, false).unwrap();

        assert_eq!(c.money.sub_total_minor, 3030);
        assert_eq!(c.money.round_off_minor, -30);
        assert_eq!(c.money.grand_total_minor, 3000);
    }

    #[test]
    fn test_round_off_half_goes_up() {
        // 1 * 10.50 -> 11.00, round_off +0.50
        let lines = vec![exempt(1, 1050)];
        let c = compute_bill_money(&lines, 0, 1300, false).unwrap();

        assert_eq!(c.money.round_off_minor, 50);
        assert_eq!(c.money.grand_total_minor, 1100);
    }

    #[test]
    fn test_vat_exempt_bill_has_zero_vat() {
        let lines = vec![exempt(10, 2550)];
        let c = compute_bill_money(&lines, 0, 1300, true).unwrap();

        assert_eq!(c.money.vat_minor, 0);
        assert_eq!(c.money.grand_total_minor, 25500);
    }

    #[test]
    fn test_full_discount() {
        let lines = vec![vatable(4, 5000)];
        let c = compute_bill_money(&lines, 10000, 1300, false).unwrap();

        assert_eq!(c.money.sub_total_minor, 20000);
        assert_eq!(c.money.discount_minor, 20000);
        assert_eq!(c.money.taxable_minor, 0);
        assert_eq!(c.money.vat_minor, 0);
        assert_eq!(c.money.grand_total_minor, 0);
    }

    #[test]
    fn test_fields_always_reconcile() {
        // taxable + vat + round_off == grand_total across a spread of inputs
        let cases = vec![
            (vec![vatable(7, 333)], 0, 1300),
            (vec![vatable(7, 333), exempt(13, 999)], 250, 1300),
            (vec![exempt(1, 1)], 0, 1300),
            (vec![vatable(99, 12345), vatable(2, 50)], 750, 1300),
            (vec![vatable(5, 2000), exempt(5, 2000)], 1000, 1500),
        ];

        for (lines, discount_bp, vat_bp) in cases {
            let c = compute_bill_money(&lines, discount_bp, vat_bp, false).unwrap();
            assert_eq!(
                c.money.taxable_minor + c.money.vat_minor + c.money.round_off_minor,
                c.money.grand_total_minor,
                "reconciliation failed for discount_bp={discount_bp}"
            );
            assert!(c.money.round_off_minor.abs() <= 50);
        }
    }

    #[test]
    fn test_empty_lines_rejected() {
        let result = compute_bill_money(&[], 0, 1300, false);
        assert_eq!(result, Err(MathError::EmptyLines));
    }

    #[test]
    fn test_amount_overflow() {
        let lines = vec![vatable(i64::MAX, 200)];
        let result = compute_bill_money(&lines, 0, 1300, false);
        assert_eq!(result, Err(MathError::AmountOverflow));
    }

    #[test]
    fn test_same_result_is_deterministic() {
        let lines = vec![vatable(10, 2550), exempt(3, 12000)];
        let a = compute_bill_money(&lines, 500, 1300, false).unwrap();
        let b = compute_bill_money(&lines, 500, 1300, false).unwrap();
        assert_eq!(a, b);
    }
}
