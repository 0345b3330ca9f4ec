//! Raw backend JSON → typed models.
//!
//! The backend serializes decimals as strings, omits fields freely and
//! sometimes returns an object where a list is expected. Everything is
//! absorbed here so the engines only ever see well-formed models:
//! numbers, numeric strings and `null` are all accepted, anything
//! unparseable becomes `0`, and a wrong shape becomes an empty collection.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use serde_json::{json, Map, Value};

use crate::models::holding::{AssetKind, Holding};
use crate::models::intraday::{IntradaySeries, Tick};
use crate::models::market::{Favorite, IndexHistory, IndexPoint, IndexQuote, TradeRecord, TradeType};
use crate::models::portfolio::{PortfolioDetail, PortfolioSummary};
use crate::models::statistics::DailyStatistic;

/// Keys of the headline indexes in the `market_indexes` payload, display order.
const INDEX_KEYS: [&str; 3] = ["shanghai", "shenzhen", "chuangye"];

static NULL: Value = Value::Null;

// ── Scalars ─────────────────────────────────────────────────────────

/// A finite number from a JSON number or numeric string; `0` otherwise.
#[must_use]
pub fn number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

#[must_use]
pub fn integer(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| number(value) as i64),
        Value::String(s) => s.trim().parse().unwrap_or_else(|_| number(value) as i64),
        _ => 0,
    }
}

/// Strings as-is, numbers rendered, anything else empty.
#[must_use]
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn optional_text(value: &Value) -> Option<String> {
    Some(text(value)).filter(|s| !s.is_empty())
}

/// `YYYY-MM-DD`, also accepting a trailing time part.
#[must_use]
pub fn date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// `YYYY-MM-DD HH:MM:SS` or ISO 8601 without offset.
#[must_use]
pub fn datetime(value: &Value) -> Option<NaiveDateTime> {
    let raw = value.as_str()?.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// `HH:MM:SS` or `HH:MM`.
#[must_use]
pub fn time(value: &Value) -> Option<NaiveTime> {
    let raw = value.as_str()?.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Array elements, or nothing when the value is not an array.
#[must_use]
pub fn items(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// First present, non-null field among `keys`.
fn field<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| !v.is_null())
        .unwrap_or(&NULL)
}

// ── Portfolio ───────────────────────────────────────────────────────

pub fn portfolio_summary(value: &Value) -> PortfolioSummary {
    PortfolioSummary {
        id: integer(field(value, &["id"])),
        name: text(field(value, &["portfolio_name", "name"])),
        description: text(field(value, &["description"])),
        total_investment: number(field(value, &["total_investment"])),
        current_value: number(field(value, &["current_value"])),
        profit_loss: number(field(value, &["profit_loss"])),
        profit_loss_rate: number(field(value, &["profit_loss_rate"])),
        created_at: datetime(field(value, &["create_time", "created_at"])),
        updated_at: datetime(field(value, &["update_time", "updated_at"])),
    }
}

pub fn portfolio_list(value: &Value) -> Vec<PortfolioSummary> {
    items(value).iter().map(portfolio_summary).collect()
}

/// Stock position from `stock_code` / `total_shares` / `avg_cost_price`.
pub fn stock_holding(value: &Value) -> Holding {
    Holding::stock(
        text(field(value, &["stock_code", "code"])),
        text(field(value, &["stock_name", "name"])),
        number(field(value, &["total_shares", "quantity"])),
        number(field(value, &["avg_cost_price", "avg_cost"])),
        number(field(value, &["current_price"])),
    )
}

/// Fund position; prices are NAVs (`avg_cost_nav`, `current_nav`).
pub fn fund_holding(value: &Value) -> Holding {
    let holding = Holding::fund(
        text(field(value, &["fund_code", "code"])),
        text(field(value, &["fund_name", "name"])),
        number(field(value, &["total_shares", "quantity"])),
        number(field(value, &["avg_cost_nav", "avg_cost"])),
        number(field(value, &["current_nav", "current_price"])),
    );
    match optional_text(field(value, &["fund_type"])) {
        Some(fund_type) => holding.with_fund_type(fund_type),
        None => holding,
    }
}

pub fn stock_holdings(value: &Value) -> Vec<Holding> {
    items(value).iter().map(stock_holding).collect()
}

pub fn fund_holdings(value: &Value) -> Vec<Holding> {
    items(value).iter().map(fund_holding).collect()
}

/// Snapshot rows without a parseable date are dropped.
pub fn daily_statistic(value: &Value) -> Option<DailyStatistic> {
    let date = date(field(value, &["statistics_date", "date"]))?;
    Some(DailyStatistic {
        date,
        total_value: number(field(value, &["total_value"])),
        total_profit_loss: number(field(value, &["total_profit_loss"])),
        total_profit_loss_rate: number(field(value, &["total_profit_loss_rate"])),
        daily_profit_loss: number(field(value, &["daily_profit_loss"])),
        daily_profit_loss_rate: number(field(value, &["daily_profit_loss_rate"])),
    })
}

pub fn daily_statistics(value: &Value) -> Vec<DailyStatistic> {
    let rows = items(value);
    let parsed: Vec<DailyStatistic> = rows.iter().filter_map(daily_statistic).collect();
    if parsed.len() < rows.len() {
        debug!("Dropped {} statistics rows without a date", rows.len() - parsed.len());
    }
    parsed
}

/// `{ portfolio, stocks, funds?, statistics }`.
pub fn portfolio_detail(value: &Value) -> PortfolioDetail {
    PortfolioDetail {
        portfolio: portfolio_summary(field(value, &["portfolio"])),
        stocks: stock_holdings(field(value, &["stocks"])),
        funds: fund_holdings(field(value, &["funds"])),
        statistics: daily_statistics(field(value, &["statistics"])),
    }
}

/// Stock and fund trades share one shape; fund rows use NAV field names.
pub fn trade_record(value: &Value) -> Option<TradeRecord> {
    let trade_type = match text(field(value, &["trade_type"])).to_ascii_lowercase().as_str() {
        "buy" => TradeType::Buy,
        "sell" => TradeType::Sell,
        _ => return None,
    };
    Some(TradeRecord {
        id: integer(field(value, &["id"])),
        code: text(field(value, &["stock_code", "fund_code", "code"])),
        name: text(field(value, &["stock_name", "fund_name", "name"])),
        trade_type,
        price: number(field(value, &["trade_price", "trade_nav", "price"])),
        quantity: number(field(value, &["trade_shares", "quantity"])),
        amount: number(field(value, &["trade_amount", "amount"])),
        fee: number(field(value, &["trade_fee", "fee"])),
        note: optional_text(field(value, &["trade_note", "note"])),
        traded_at: optional_text(field(value, &["trade_time", "trade_date"])),
    })
}

pub fn trade_records(value: &Value) -> Vec<TradeRecord> {
    items(value).iter().filter_map(trade_record).collect()
}

pub fn favorite(value: &Value) -> Favorite {
    Favorite {
        code: text(field(value, &["stock_code", "fund_code", "code"])),
        name: text(field(value, &["stock_name", "fund_name", "name"])),
        note: optional_text(field(value, &["note"])),
    }
}

pub fn favorites(value: &Value) -> Vec<Favorite> {
    items(value).iter().map(favorite).collect()
}

// ── Market data ─────────────────────────────────────────────────────

/// `{ name, data: [{ date, close }] }`; rows without a date are dropped.
pub fn index_history(value: &Value) -> IndexHistory {
    let points = items(field(value, &["data"]))
        .iter()
        .filter_map(|row| {
            Some(IndexPoint {
                date: date(field(row, &["date"]))?,
                close: number(field(row, &["close"])),
            })
        })
        .collect();
    let name = optional_text(field(value, &["name"]))
        .unwrap_or_else(|| text(field(value, &["code"])));
    IndexHistory::new(name, points)
}

/// The three headline quotes, in fixed order; missing entries are skipped.
pub fn index_quotes(value: &Value) -> Vec<IndexQuote> {
    INDEX_KEYS
        .iter()
        .filter_map(|key| value.get(*key))
        .filter(|entry| entry.is_object())
        .map(|entry| IndexQuote {
            code: text(field(entry, &["code"])),
            name: text(field(entry, &["name"])),
            level: number(field(entry, &["index", "level"])),
            change: number(field(entry, &["change"])),
            change_rate: number(field(entry, &["changePercent", "change_percent"])),
        })
        .collect()
}

/// `{ prev_close, open_price, chart_data: [{ time, price, volume }] }`.
pub fn intraday_series(value: &Value) -> IntradaySeries {
    let ticks = items(field(value, &["chart_data", "ticks"]))
        .iter()
        .filter_map(|row| {
            Some(Tick::new(
                time(field(row, &["time"]))?,
                number(field(row, &["price"])),
                number(field(row, &["volume"])),
            ))
        })
        .collect();
    IntradaySeries::new(
        ticks,
        number(field(value, &["prev_close", "previous_close"])),
        number(field(value, &["open_price", "open"])),
    )
}

/// Session token from a login payload: either the bare string or `{ token }`.
pub fn token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(_) => optional_text(field(value, &["token", "access_token"])),
        _ => None,
    }
}

// ── Request bodies ──────────────────────────────────────────────────

/// Position body in the backend's per-kind field names.
pub fn holding_body(holding: &Holding) -> Value {
    match holding.kind {
        AssetKind::Stock => json!({
            "stock_code": holding.code,
            "stock_name": holding.name,
            "total_shares": holding.quantity,
            "avg_cost_price": holding.avg_cost,
            "current_price": holding.current_price,
        }),
        AssetKind::Fund => {
            let mut body = Map::new();
            body.insert("fund_code".into(), json!(holding.code));
            body.insert("fund_name".into(), json!(holding.name));
            body.insert("total_shares".into(), json!(holding.quantity));
            body.insert("avg_cost_nav".into(), json!(holding.avg_cost));
            body.insert("current_nav".into(), json!(holding.current_price));
            if let Some(fund_type) = &holding.fund_type {
                body.insert("fund_type".into(), json!(fund_type));
            }
            Value::Object(body)
        }
    }
}

/// Trade body; `kind` picks stock or fund field names.
pub fn trade_body(trade: &TradeRecord, kind: AssetKind) -> Value {
    let (code_key, name_key, price_key) = match kind {
        AssetKind::Stock => ("stock_code", "stock_name", "trade_price"),
        AssetKind::Fund => ("fund_code", "fund_name", "trade_nav"),
    };
    let mut body = Map::new();
    body.insert(code_key.into(), json!(trade.code));
    body.insert(name_key.into(), json!(trade.name));
    body.insert("trade_type".into(), json!(trade.trade_type.to_string()));
    body.insert(price_key.into(), json!(trade.price));
    body.insert("trade_shares".into(), json!(trade.quantity));
    body.insert("trade_fee".into(), json!(trade.fee));
    if let Some(note) = &trade.note {
        body.insert("trade_note".into(), json!(note));
    }
    Value::Object(body)
}
