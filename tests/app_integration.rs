// Adds automatic logging to tests via test_log.
mod test_utils {
    use std::fs;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const PRODUCT_LIST: &str = r#"[
        {"name": "LifeStrategy 60% Equity Fund", "portId": "0895", "shareClass": "Accumulation"},
        {"name": "LifeStrategy 60% Equity Fund", "portId": "0896", "shareClass": "Income"},
        {"name": " FTSE Global All Cap Index Fund", "portId": "9679", "shareClass": "Accumulation"}
    ]"#;

    /// Mounts the product list plus a GraphQL NAV history response on one
    /// mock server.
    pub async fn create_mock_server(history_response: &str, history_status: u16) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/productList/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_LIST))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/gpx/graphql"))
            .respond_with(ResponseTemplate::new(history_status).set_body_string(history_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(base_url: &str) -> tempfile::NamedTempFile {
        let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
provider:
  base_url: {base_url}
currency: "GBP"
initial_investment: 10000.0
"#
        );
        fs::write(config_file.path(), config_content).expect("Failed to write config file");
        config_file
    }
}

const MOCK_HISTORY: &str = r#"{
    "data": {
        "funds": [{
            "pricingDetails": {
                "navPrices": {
                    "items": [
                        {"price": 100.0, "asOfDate": "2020-01-02T00:00:00-05:00", "currencyCode": "GBP"},
                        {"price": 110.0, "asOfDate": "2020-01-03T00:00:00-05:00", "currencyCode": "GBP"},
                        {"price": 99.0, "asOfDate": "2020-01-06T00:00:00-05:00", "currencyCode": "GBP"}
                    ]
                }
            }
        }]
    }
}"#;

fn compare_options(funds: Vec<&str>) -> fundcmp::CompareOptions {
    fundcmp::CompareOptions {
        funds: funds.into_iter().map(String::from).collect(),
        start_date: "2020-01-01".to_string(),
        lump_sum: Some(1000.0),
        forecast: false,
        model: fundcmp::ModelChoice::AutoAr,
    }
}

#[test_log::test(tokio::test)]
async fn test_compare_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(MOCK_HISTORY, 200).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fundcmp::run_command(
        fundcmp::AppCommand::Compare(compare_options(vec!["lifestrategy 60"])),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(
        result.is_ok(),
        "Compare command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_compare_fails_when_history_is_empty() {
    let empty_history = r#"{
        "data": {
            "funds": [{
                "pricingDetails": {"navPrices": {"items": []}}
            }]
        }
    }"#;
    let mock_server = test_utils::create_mock_server(empty_history, 200).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    // A single selected fund with no observations leaves nothing to show.
    let result = fundcmp::run_command(
        fundcmp::AppCommand::Compare(compare_options(vec!["lifestrategy 60"])),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_compare_fails_fast_on_server_error() {
    let mock_server = test_utils::create_mock_server("oops", 500).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fundcmp::run_command(
        fundcmp::AppCommand::Compare(compare_options(vec!["lifestrategy 60"])),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_compare_rejects_malformed_date() {
    let mock_server = test_utils::create_mock_server(MOCK_HISTORY, 200).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let mut options = compare_options(vec!["lifestrategy 60"]);
    options.start_date = "01/06/2020".to_string();

    let result = fundcmp::run_command(
        fundcmp::AppCommand::Compare(options),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_compare_reports_unknown_fund_distinctly() {
    let mock_server = test_utils::create_mock_server(MOCK_HISTORY, 200).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fundcmp::run_command(
        fundcmp::AppCommand::Compare(compare_options(vec!["emerging markets"])),
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    // Nothing matched the catalog, which is an input problem rather than
    // a fetch failure.
    let err = result.unwrap_err();
    assert!(err.to_string().contains("matched"));
}

#[test_log::test(tokio::test)]
async fn test_funds_listing_with_mock() {
    let mock_server = test_utils::create_mock_server(MOCK_HISTORY, 200).await;
    let config_file = test_utils::write_config(&mock_server.uri());

    let result = fundcmp::run_command(
        fundcmp::AppCommand::Funds,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;

    assert!(
        result.is_ok(),
        "Funds command failed with: {:?}",
        result.err()
    );
}
