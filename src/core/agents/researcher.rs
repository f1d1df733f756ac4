use crate::core::dataset::DatasetSummary;
use crate::core::reply::parse_json_reply;
use crate::domain::model::{CompletionRequest, Findings, RetailDataset};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;

const MAX_TOKENS: u32 = 4000;

fn research_prompt(goal: &str, data_summary: &str) -> String {
    format!(
        r#"You are a retail analyst specializing in inventory and sales analysis.

Goal: {goal}

You have TWO datasets:

INVENTORY DATA columns: Product, Packsize, Headoffice ID, Barcode, OrderList (supplier), Case Size, Trade Price, RRP, Dept Fullname, Group Fullname, Branch Name, Branch Stock Level

SALES DATA columns: Product, Packsize, Headoffice ID, Branch Name, Dept Fullname, Group Fullname, Trade Price, RRP, Sale ID, Qty Sold, Turnover, Vat Amount, Sale VAT Rate, Turnover ex VAT, Disc Amount, Profit, Refund Value

Sample from both datasets:
{data_summary}

Analyze both datasets together for the goal:
- stock levels, supplier diversity (OrderList), pricing (Trade Price vs RRP), departments
- sales performance (Qty Sold, Turnover, Profit), margins, discounts, best sellers, branches
- match stock with sales velocity, spot overstock/understock and supplier patterns

Return a JSON object with these fields:
{{
  "summary": "Brief summary combining inventory and sales insights",
  "key_findings": ["finding 1", "finding 2"],
  "relevant_suppliers": [
    {{
      "supplier": "OrderList name",
      "product": "Product name",
      "department": "Dept Fullname",
      "trade_price": 0,
      "rrp": 0,
      "stock_level": 0,
      "qty_sold": 0,
      "turnover": 0,
      "profit": 0,
      "reason": "why relevant"
    }}
  ],
  "statistics": {{
    "total_products": 0,
    "unique_suppliers": 0,
    "total_sales_transactions": 0,
    "total_revenue": 0,
    "total_profit": 0,
    "avg_profit_margin": 0,
    "top_selling_products": [{{"product": "name", "qty_sold": 0, "turnover": 0}}],
    "top_suppliers": [{{"supplier": "name", "product_count": 0, "total_sales": 0}}]
  }},
  "recommendations": ["recommendation 1", "recommendation 2"]
}}

Only return the JSON object, no other text."#
    )
}

/// Researcher agent: analyzes a sample of the inventory and sales rows.
pub async fn analyze_suppliers(
    model: &dyn ModelClient,
    goal: &str,
    dataset: &RetailDataset,
) -> Result<Findings> {
    let data_summary = DatasetSummary::from_dataset(dataset).to_pretty_json()?;
    let reply = model
        .complete(CompletionRequest::new(
            research_prompt(goal, &data_summary),
            MAX_TOKENS,
        ))
        .await?;
    let findings: Findings = parse_json_reply(&reply)?;

    tracing::info!(
        "🔎 Researcher flagged {} relevant suppliers",
        findings.relevant_suppliers().len()
    );
    Ok(findings)
}
