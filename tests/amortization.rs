use annuity_finance::{
    Annuity, AnnuityError, AnnuityInput, PrepaymentEntry, Prepayments, annuity_payment, balance, balance_iterative,
    effective_periodic_rate, fv_factor, nominal_annual_rate, schedule,
};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_closed_form_and_iterative_balances_agree() -> anyhow::Result<()> {
    let principal = dec!(1000.0);
    let num_periods = 2;
    let periodic_interest = dec!(0.05);
    let payment = annuity_payment(principal, periodic_interest, num_periods)?;
    let prepayments = [dec!(100.0), dec!(0.0)];
    let payments: Vec<Decimal> = prepayments.iter().map(|extra| payment + extra).collect();

    for period in 0..=num_periods {
        let closed = balance(principal, periodic_interest, payment, period, &prepayments)?;
        let iterative = balance_iterative(principal, periodic_interest, &payments, period)?;
        assert!((closed - iterative).abs() <= dec!(0.00000001), "period {period}");
    }
    Ok(())
}

#[test]
fn test_mortgage_rate_round_trip() -> anyhow::Result<()> {
    let annuity = Annuity::new(360, Some(dec!(800000)), Some(dec!(4000)), None)?;
    let rate = annuity.periodic_interest()?;

    let recomputed = annuity_finance::annuity_payment_unrounded(dec!(800000), rate, 360)?;
    assert!((recomputed - dec!(4000)).abs() <= dec!(0.0000000000000001));

    let annual = nominal_annual_rate(rate, 12);
    assert!(annual > dec!(0.04) && annual < dec!(0.05));
    Ok(())
}

#[rstest]
#[case(dec!(80_000_000), dec!(0.0035), 360)]
#[case(dec!(25_000_000), dec!(0.005), 180)]
#[case(dec!(1_200_000), dec!(0.01), 12)]
#[case(dec!(999_999), dec!(0.02), 48)]
fn test_schedule_conservation(
    #[case] principal: Decimal,
    #[case] rate: Decimal,
    #[case] n: u32,
) -> anyhow::Result<()> {
    let annuity = Annuity::new(i64::from(n), Some(principal), None, Some(rate))?;
    let result = schedule(&annuity, &Prepayments::new())?;
    let periods = Decimal::from(n);

    // only the payment is rounded, by at most half a unit each period
    assert!(result.final_balance().abs() <= dec!(0.5) * fv_factor(rate, n)?);
    // each interest portion is rounded by at most half a unit
    let drift = result.total_principal() - (principal - result.final_balance());
    assert!(drift.abs() <= dec!(0.5) * periods + dec!(0.000001), "drift {drift}");
    assert!((result.total_principal() - principal).abs() <= periods * dec!(1.5));
    Ok(())
}

#[test]
fn test_conservation_with_prepayments() -> anyhow::Result<()> {
    let annuity = Annuity::new(360, Some(dec!(80_000_000)), None, Some(dec!(0.0035)))?;
    let prepayments = Prepayments::from_entries([
        PrepaymentEntry {
            period: 22,
            payment: dec!(300_000),
        },
        PrepaymentEntry {
            period: 30,
            payment: dec!(200_000),
        },
    ])?;
    let result = schedule(&annuity, &prepayments)?;
    let plain = schedule(&annuity, &Prepayments::new())?;

    let repaid = result.total_principal() + result.total_prepaid;
    let drift = repaid - (dec!(80_000_000) - result.final_balance());
    assert!(drift.abs() <= dec!(180) + dec!(0.000001));

    // prepaying lowers every later interest portion and leaves the loan overpaid
    assert!(result.total_interest() < plain.total_interest());
    assert!(result.records[22].interest < plain.records[22].interest);
    assert!(result.final_balance() < plain.final_balance() - dec!(500_000));
    assert_eq!(result.records[..21], plain.records[..21]);
    Ok(())
}

#[test]
fn test_schedule_matches_closed_form_balances() -> anyhow::Result<()> {
    let annuity = Annuity::new(120, Some(dec!(5_000_000)), Some(dec!(55_000)), None)?;
    let prepayments = Prepayments::from_json_str(r#"[{"period": 10, "payment": 40000}, {"period": 75, "payment": 125000}]"#)?;
    let result = schedule(&annuity, &prepayments)?;

    let rate = annuity.periodic_interest()?;
    let dense = prepayments.to_dense(annuity.num_periods());
    for record in &result {
        let closed = balance(annuity.principal(), rate, annuity.payment(), record.period, &dense)?;
        assert!((record.balance - closed).abs() <= dec!(0.00000001), "period {}", record.period);
    }
    Ok(())
}

#[test]
fn test_one_year_price_table() -> anyhow::Result<()> {
    // 12,000.00 over 12 months at 12% a year
    let monthly = effective_periodic_rate(dec!(12), 12)?;
    let annuity = Annuity::new(12, Some(dec!(1_200_000)), None, Some(monthly))?;
    let result = schedule(&annuity, &Prepayments::new())?;

    assert!(result.payment > dec!(106_270) && result.payment < dec!(106_280));
    assert!(result.total_paid() > dec!(1_275_240) && result.total_paid() < dec!(1_275_360));
    Ok(())
}

#[test]
fn test_error_scenarios() {
    assert!(matches!(
        Annuity::new(12, Some(dec!(1000)), None, None),
        Err(AnnuityError::Validation { .. })
    ));
    assert!(matches!(
        Annuity::new(12, Some(dec!(1000)), None, Some(dec!(1.5))),
        Err(AnnuityError::Validation { .. })
    ));

    let annuity = Annuity::new(12, Some(dec!(1000)), Some(dec!(1000)), None).expect("valid construction");
    assert!(matches!(
        annuity.periodic_interest(),
        Err(AnnuityError::InvalidParameters { .. })
    ));
}

#[test]
fn test_json_inputs_end_to_end() -> anyhow::Result<()> {
    let input: AnnuityInput = serde_json::from_str(r#"{"num_periods": 24, "principal": 2400000, "periodic_interest": 0}"#)?;
    let annuity = Annuity::try_from(input)?;
    let prepayments = Prepayments::from_json_str(r#"[{"period": 12, "payment": 100000}]"#)?;
    let result = schedule(&annuity, &prepayments)?;

    assert_eq!(result.payment, dec!(100000));
    assert_eq!(result.records[11].balance, dec!(1_100_000));
    assert_eq!(result.final_balance(), dec!(-100_000));

    let csv_rows: Vec<serde_json::Value> = result.postings().map(serde_json::to_value).collect::<Result<_, _>>()?;
    assert_eq!(csv_rows.len(), 48);
    assert_eq!(csv_rows[1]["account"], "principal");
    Ok(())
}
