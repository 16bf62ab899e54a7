//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tradeops::{BrokerForm, LotRule, LotRuleTable, Offset, OrderPricer, OrderSettings};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub broker_form: BrokerForm,
    #[serde(default)]
    pub lot_rules: Vec<LotRuleConfig>,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// CSV with a `trade_date` column.
    pub calendar: PathBuf,
    /// TOML table per product code.
    pub instruments: PathBuf,
    /// CSV `trade_date,cash_flow`.
    pub cash_flow: PathBuf,
    /// CSV `trade_date,cash_flow,equity`, written by `allocated`.
    pub allocated_equity: PathBuf,
    /// Root of signals/, positions/, trades/, quotes/ and orders/.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_drift")]
    pub drift: Decimal,
    #[serde(default = "default_equity_share")]
    pub equity_share: Decimal,
    #[serde(default = "default_strategy_open")]
    pub strategy_open: String,
    #[serde(default = "default_strategy_close")]
    pub strategy_close: String,
}

fn default_drift() -> Decimal {
    Decimal::new(3, 2)
}
fn default_equity_share() -> Decimal {
    Decimal::new(5, 1)
}
fn default_strategy_open() -> String {
    "opn".into()
}
fn default_strategy_close() -> String {
    "cls".into()
}

/// An extra lot rule on top of the exchange defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct LotRuleConfig {
    pub product: String,
    /// `open` or `close`.
    pub offset: String,
    pub multiple: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchConfig {
    /// Directory order files are copied to. Dispatch is off when unset.
    pub outbox: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let e = &self.execution;
        if e.drift < Decimal::ZERO || e.drift >= Decimal::ONE {
            return Err(Error::Config("drift must be in [0.0, 1.0)".into()));
        }
        if e.equity_share <= Decimal::ZERO || e.equity_share > Decimal::ONE {
            return Err(Error::Config("equity_share must be in (0.0, 1.0]".into()));
        }
        for rule in &self.lot_rules {
            self.parse_rule(rule)?;
        }
        Ok(())
    }

    fn parse_rule(&self, rule: &LotRuleConfig) -> Result<LotRule> {
        if rule.multiple == 0 {
            return Err(Error::Config(format!(
                "lot rule for {} must have a multiple > 0",
                rule.product
            )));
        }
        let offset: Offset = rule.offset.parse()?;
        Ok(LotRule::new(rule.product.clone(), offset, rule.multiple)?)
    }

    /// Exchange default lot rules extended with the configured ones.
    pub fn lot_rule_table(&self) -> Result<LotRuleTable> {
        let mut table = LotRuleTable::standard();
        for rule in &self.lot_rules {
            table.insert(self.parse_rule(rule)?);
        }
        Ok(table)
    }

    /// Everything the order stage needs.
    pub fn order_settings(&self) -> Result<OrderSettings> {
        Ok(OrderSettings {
            pricer: OrderPricer::new(self.execution.drift)?,
            strategy_open: self.execution.strategy_open.clone(),
            strategy_close: self.execution.strategy_close.clone(),
            form: self.broker_form.clone(),
            lot_rules: self.lot_rule_table()?,
        })
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
