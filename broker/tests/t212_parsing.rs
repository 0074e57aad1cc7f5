//! Tests for Trading 212 API payloads. No live connection needed.

#[cfg(feature = "t212")]
mod t212_tests {
    use chrono::{TimeZone, Utc};
    use fundpie::Allocation;
    use fundpie_broker::t212::Environment;
    use fundpie_broker::t212::client::base_url;
    use fundpie_broker::{Account, Instrument, PieCreated, PieRequest};
    use rust_decimal_macros::dec;

    // ========================================================================
    // Instrument metadata parsing
    // ========================================================================

    #[test]
    fn parse_instrument_list() {
        let json = r#"[
            {
                "ticker": "AAPL_US_EQ",
                "type": "STOCK",
                "workingScheduleId": 71,
                "isin": "US0378331005",
                "currencyCode": "USD",
                "name": "Apple",
                "shortName": "AAPL",
                "maxOpenQuantity": 10000.0,
                "addedOn": "2018-07-12T16:06:45.000+03:00"
            },
            {
                "ticker": "VUSAl_EQ",
                "type": "ETF",
                "currencyCode": "GBX"
            }
        ]"#;

        let instruments: Vec<Instrument> = serde_json::from_str(json).unwrap();
        assert_eq!(instruments.len(), 2);
        assert_eq!(instruments[0].ticker, "AAPL_US_EQ");
        assert_eq!(instruments[0].kind.as_deref(), Some("STOCK"));
        assert_eq!(instruments[0].isin.as_deref(), Some("US0378331005"));
        assert_eq!(instruments[0].short_name.as_deref(), Some("AAPL"));
        assert_eq!(instruments[0].record().base_symbol, "AAPL");
        assert_eq!(instruments[1].currency_code.as_deref(), Some("GBX"));
        assert_eq!(instruments[1].name, None);
    }

    #[test]
    fn instrument_requires_ticker() {
        let json = r#"[{ "type": "STOCK", "currencyCode": "USD" }]"#;
        assert!(serde_json::from_str::<Vec<Instrument>>(json).is_err());
    }

    #[test]
    fn cached_instruments_round_trip() {
        let original = vec![
            Instrument::new("KO_US_EQ").with_currency("USD"),
            Instrument::new("PEP_US_EQ"),
        ];
        let text = serde_json::to_string(&original).unwrap();
        assert!(!text.contains("isin"), "empty fields are not written");
        let back: Vec<Instrument> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
    }

    // ========================================================================
    // Account parsing
    // ========================================================================

    #[test]
    fn parse_account_info() {
        let json = r#"{ "currencyCode": "EUR", "id": 20110713 }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.id, 20110713);
        assert_eq!(account.currency_code, "EUR");
    }

    // ========================================================================
    // Pie request / response
    // ========================================================================

    #[test]
    fn pie_request_body_matches_api() {
        let shares = Allocation::from_entries(vec![
            ("AVGO_US_EQ".into(), dec!(0.509)),
            ("KO_US_EQ".into(), dec!(0.491)),
        ]);
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let req = PieRequest::new("SCHD", shares, now);
        req.validate().unwrap();

        let body: serde_json::Value = serde_json::to_value(&req).unwrap();
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        for key in [
            "dividendCashAction",
            "endDate",
            "goal",
            "icon",
            "instrumentShares",
            "name",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(body["endDate"], "2027-01-02T03:04:05Z");
        assert_eq!(body["instrumentShares"]["AVGO_US_EQ"].as_f64(), Some(0.509));
    }

    #[test]
    fn parse_pie_created_response() {
        let json = r#"{
            "instruments": [
                { "ticker": "KO_US_EQ", "expectedShare": 0.491, "currentShare": 0 }
            ],
            "settings": {
                "id": 987654,
                "name": "SCHD",
                "icon": "Bills",
                "goal": 0,
                "dividendCashAction": "REINVEST",
                "endDate": "2027-01-02T03:04:05Z"
            }
        }"#;
        let raw: serde_json::Value = serde_json::from_str(json).unwrap();
        let created = PieCreated::from_response(raw);
        assert_eq!(created.id, Some(987654));
        assert_eq!(created.name.as_deref(), Some("SCHD"));
        assert_eq!(created.raw["instruments"][0]["ticker"], "KO_US_EQ");
    }

    // ========================================================================
    // Connection settings
    // ========================================================================

    #[test]
    fn urls_follow_environment_and_version() {
        assert_eq!(
            base_url(Environment::from_demo_flag(true), 0),
            "https://demo.trading212.com/api/v0/equity"
        );
        assert_eq!(
            base_url(Environment::from_demo_flag(false), 0),
            "https://live.trading212.com/api/v0/equity"
        );
    }
}
