//! Cost Management query API

use super::client::{ManagementSession, COST_MANAGEMENT_API_VERSION};
use anyhow::Result;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `Microsoft.CostManagement/query`
#[derive(Debug, Serialize)]
pub struct CostQuery {
    #[serde(rename = "type")]
    pub query_type: &'static str,
    pub timeframe: String,
    pub dataset: Dataset,
}

#[derive(Debug, Serialize)]
pub struct Dataset {
    pub granularity: &'static str,
    pub aggregation: Aggregation,
}

#[derive(Debug, Serialize)]
pub struct Aggregation {
    #[serde(rename = "totalCost")]
    pub total_cost: AggregationFunction,
}

#[derive(Debug, Serialize)]
pub struct AggregationFunction {
    pub name: &'static str,
    pub function: &'static str,
}

impl CostQuery {
    /// Daily actual cost, summed into a column named "Cost"
    pub fn daily_actual_cost(timeframe: &str) -> Self {
        Self {
            query_type: "ActualCost",
            timeframe: timeframe.to_string(),
            dataset: Dataset {
                granularity: "Daily",
                aggregation: Aggregation {
                    total_cost: AggregationFunction {
                        name: "Cost",
                        function: "Sum",
                    },
                },
            },
        }
    }
}

/// Successful query response; only the row table is used
#[derive(Debug, Default, Deserialize)]
pub struct CostQueryResponse {
    #[serde(default)]
    pub properties: Option<CostQueryProperties>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CostQueryProperties {
    #[serde(default)]
    pub rows: Option<Vec<Value>>,
}

impl CostQueryResponse {
    /// Rows of the result table; absent means empty
    pub fn into_rows(self) -> Vec<Value> {
        self.properties.and_then(|p| p.rows).unwrap_or_default()
    }
}

impl ManagementSession {
    /// Cost Management query endpoint for this subscription
    pub fn cost_query_url(&self) -> String {
        self.subscription_url(
            "providers/Microsoft.CostManagement/query",
            COST_MANAGEMENT_API_VERSION,
        )
    }

    /// Issue one cost query. Status and body are returned as-is so the
    /// caller can report a failure verbatim.
    pub async fn query_costs(&self, query: &CostQuery) -> Result<(StatusCode, String)> {
        let url = self.cost_query_url();
        tracing::info!("Querying costs at {} (timeframe: {})", url, query.timeframe);
        self.http().post_json(&url, self.bearer_token(), query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_body_shape() {
        let body = serde_json::to_value(CostQuery::daily_actual_cost("MonthToDate")).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "ActualCost",
                "timeframe": "MonthToDate",
                "dataset": {
                    "granularity": "Daily",
                    "aggregation": {
                        "totalCost": {"name": "Cost", "function": "Sum"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_missing_properties_yields_no_rows() {
        let response: CostQueryResponse = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert!(response.into_rows().is_empty());
    }

    #[test]
    fn test_missing_rows_yields_no_rows() {
        let response: CostQueryResponse =
            serde_json::from_value(json!({"properties": {"columns": []}})).unwrap();
        assert!(response.into_rows().is_empty());
    }

    #[test]
    fn test_rows_are_kept_in_order() {
        let response: CostQueryResponse = serde_json::from_value(json!({
            "properties": {"rows": [[1.0, 20240101, "USD"], [2.0, 20240102, "USD"]]}
        }))
        .unwrap();
        let rows = response.into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], json!(2.0));
    }
}
