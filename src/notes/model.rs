use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::tickers::FuturesTicker;

/// Asset name used for the placeholder trade of a note without trades
pub const PLACEHOLDER_ASSET: &str = "NOTA SEM TRANSAÇÕES";
/// Broker id when no broker pattern matches
pub const UNKNOWN_BROKER: &str = "Desconhecida";

/// Buy/sell column of a note ("C/V")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Buy,
    Sell,
    /// Placeholder rows that carry only note-level data
    Other,
}

impl Side {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" | "COMPRA" | "COMPRAR" | "BUY" => Some(Side::Buy),
            "V" | "VENDA" | "VENDER" | "SELL" => Some(Side::Sell),
            "X" => Some(Side::Other),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Side::Buy => "C",
            Side::Sell => "V",
            Side::Other => "X",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Side::Buy => "Compra",
            Side::Sell => "Venda",
            Side::Other => "Outro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeKind {
    Normal,
    DayTrade,
}

impl TradeKind {
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        if upper.contains("DAY") {
            Some(TradeKind::DayTrade)
        } else if upper.trim() == "NORMAL" {
            Some(TradeKind::Normal)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Normal => "NORMAL",
            TradeKind::DayTrade => "DAY TRADE",
        }
    }
}

/// D/C column: whether the operation value debits or credits the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebitCredit {
    Debit,
    Credit,
}

impl DebitCredit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "D" | "DEBITO" | "DÉBITO" => Some(DebitCredit::Debit),
            "C" | "CREDITO" | "CRÉDITO" => Some(DebitCredit::Credit),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            DebitCredit::Debit => "D",
            DebitCredit::Credit => "C",
        }
    }
}

/// One executed trade of a note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    /// Asset as printed on the note
    pub asset: String,
    /// Commodity/ticker column: the futures product, or the asset itself
    pub ticker: String,
    pub maturity: Option<String>,
    pub maturity_month: Option<String>,
    pub maturity_date: Option<NaiveDate>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
    pub kind: Option<TradeKind>,
    pub debit_credit: Option<DebitCredit>,
    pub operation_value: Decimal,
    pub operational_fee: Decimal,
}

impl Trade {
    /// Trade with `total = quantity × price`; `None` when the product
    /// overflows, which only happens on garbled note text
    pub fn new(
        side: Side,
        asset: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Option<Self> {
        let total = quantity.checked_mul(price)?;
        Some(Self::with_values(side, asset.into(), quantity, price, total))
    }

    fn with_values(side: Side, asset: String, quantity: Decimal, price: Decimal, total: Decimal) -> Self {
        let asset = asset.trim().to_string();
        Self {
            side,
            ticker: asset.clone(),
            asset,
            maturity: None,
            maturity_month: None,
            maturity_date: None,
            quantity,
            price,
            total,
            kind: None,
            debit_credit: None,
            operation_value: Decimal::ZERO,
            operational_fee: Decimal::ZERO,
        }
    }

    /// Keep the total printed on the note instead of quantity × price
    pub fn with_total(mut self, total: Decimal) -> Self {
        if !total.is_zero() {
            self.total = total;
        }
        self
    }

    /// Fill commodity and maturity fields from a decomposed futures ticker.
    /// A printed expiry date wins over the approximated one.
    pub fn with_futures(mut self, ticker: &FuturesTicker) -> Self {
        self.ticker = ticker.product.clone();
        self.maturity = Some(ticker.maturity.code());
        self.maturity_month = Some(ticker.maturity.month_name().to_string());
        if self.maturity_date.is_none() {
            self.maturity_date = ticker.maturity.approx_expiry();
        }
        self
    }

    pub fn placeholder() -> Self {
        Self::with_values(
            Side::Other,
            PLACEHOLDER_ASSET.to_string(),
            Decimal::ONE,
            Decimal::ZERO,
            Decimal::ZERO,
        )
    }

    pub fn is_placeholder(&self) -> bool {
        self.side == Side::Other && self.asset == PLACEHOLDER_ASSET
    }

    /// Identity used to drop the same trade matched by two patterns
    pub fn dedup_key(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.side.as_code(),
            self.ticker,
            self.maturity.as_deref().unwrap_or(""),
            self.quantity.normalize(),
            self.price.normalize()
        )
    }
}

/// Note-level costs and values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FeeKind {
    Settlement,
    Registration,
    TermOptions,
    Ana,
    Emoluments,
    Operational,
    Execution,
    Brokerage,
    Iss,
    Irrf,
    Others,
    Adjustment,
    NetValue,
    OperationValue,
}

impl FeeKind {
    pub const ALL: [FeeKind; 14] = [
        FeeKind::Settlement,
        FeeKind::Registration,
        FeeKind::TermOptions,
        FeeKind::Ana,
        FeeKind::Emoluments,
        FeeKind::Operational,
        FeeKind::Execution,
        FeeKind::Brokerage,
        FeeKind::Iss,
        FeeKind::Irrf,
        FeeKind::Others,
        FeeKind::Adjustment,
        FeeKind::NetValue,
        FeeKind::OperationValue,
    ];

    /// Costs charged on the note; net value, adjustment and the D/C
    /// operation value are results, not costs
    pub fn is_cost(&self) -> bool {
        !matches!(
            self,
            FeeKind::Adjustment | FeeKind::NetValue | FeeKind::OperationValue
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeeKind::Settlement => "Taxa de Liquidação",
            FeeKind::Registration => "Taxa de Registro",
            FeeKind::TermOptions => "Taxa de Termo/Opções",
            FeeKind::Ana => "Taxa A.N.A",
            FeeKind::Emoluments => "Emolumentos",
            FeeKind::Operational => "Taxa Operacional (Nota)",
            FeeKind::Execution => "Execução",
            FeeKind::Brokerage => "Corretagem",
            FeeKind::Iss => "ISS",
            FeeKind::Irrf => "IRRF Retido na Fonte",
            FeeKind::Others => "Outros",
            FeeKind::Adjustment => "Ajuste",
            FeeKind::NetValue => "Valor Líquido",
            FeeKind::OperationValue => "Valor Operação D/C",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fees {
    values: BTreeMap<FeeKind, Decimal>,
}

impl Fees {
    pub fn get(&self, kind: FeeKind) -> Decimal {
        self.values.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, kind: FeeKind) -> bool {
        self.values.contains_key(&kind)
    }

    pub fn set(&mut self, kind: FeeKind, value: Decimal) {
        self.values.insert(kind, value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeeKind, Decimal)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn total_costs(&self) -> Decimal {
        self.iter()
            .filter(|(kind, _)| kind.is_cost())
            .fold(Decimal::ZERO, |acc, (_, value)| acc.saturating_add(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSummary {
    pub total_buys: Decimal,
    pub total_sells: Decimal,
    pub net_value: Decimal,
}

/// Everything extracted from one brokerage note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokerageNote {
    pub file_name: String,
    pub broker: String,
    pub number: Option<String>,
    pub date: Option<NaiveDate>,
    pub client: Option<String>,
    pub trades: Vec<Trade>,
    pub fees: Fees,
    /// Name of the extractor that produced this note
    pub extractor: String,
}

impl BrokerageNote {
    pub fn new(file_name: impl Into<String>, extractor: &str) -> Self {
        Self {
            file_name: file_name.into(),
            broker: UNKNOWN_BROKER.to_string(),
            number: None,
            date: None,
            client: None,
            trades: Vec::new(),
            fees: Fees::default(),
            extractor: extractor.to_string(),
        }
    }

    /// Trades other than the placeholder
    pub fn real_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| !t.is_placeholder())
    }

    pub fn has_trades(&self) -> bool {
        self.real_trades().next().is_some()
    }

    /// Whether anything beyond the file name was recognised
    pub fn has_content(&self) -> bool {
        !self.trades.is_empty()
            || !self.fees.is_empty()
            || self.number.is_some()
            || self.broker != UNKNOWN_BROKER
    }

    /// Add a trade unless an identical one was already extracted
    pub fn push_trade(&mut self, trade: Trade) -> bool {
        let key = trade.dedup_key();
        if self.trades.iter().any(|t| t.dedup_key() == key) {
            return false;
        }
        self.trades.push(trade);
        true
    }

    /// Buys and sells from the trades; the net value printed on the note
    /// wins over the computed one
    pub fn summary(&self) -> NoteSummary {
        let total_buys: Decimal = self
            .real_trades()
            .filter(|t| t.side == Side::Buy)
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.total));
        let total_sells: Decimal = self
            .real_trades()
            .filter(|t| t.side == Side::Sell)
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.total));

        let net_value = if self.fees.contains(FeeKind::NetValue) {
            self.fees.get(FeeKind::NetValue)
        } else {
            total_sells
                .saturating_sub(total_buys)
                .saturating_sub(self.fees.total_costs())
        };

        NoteSummary {
            total_buys,
            total_sells,
            net_value,
        }
    }
}
