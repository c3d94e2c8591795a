//! Configuration validation.
//!
//! Validates all config fields before a run; the first violation wins.

use crate::domain::error::TicksimError;
use crate::ports::config_port::ConfigPort;

pub const STRATEGY_NAMES: [&str; 3] = ["breakout", "mean_reversion", "delta_trend"];

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    validate_symbol(config)?;
    validate_tick_size(config)?;
    validate_size(config)?;
    validate_feature_window(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    validate_daily_stop_loss(config)?;
    for key in [
        "per_trade_stop_ticks",
        "breakeven_ticks",
        "breakeven_plus",
        "trailing_ticks",
        "max_daily_trades",
    ] {
        validate_non_negative_int(config, "risk", key)?;
    }
    let tick_size = config.get_double("risk", "tick_size", 0.0);
    if tick_size < 0.0 {
        return Err(TicksimError::ConfigInvalid {
            section: "risk".to_string(),
            key: "tick_size".to_string(),
            reason: "tick_size must be non-negative".to_string(),
        });
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    let name = match config.get_string("strategy", "name") {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => {
            return Err(TicksimError::ConfigMissing {
                section: "strategy".to_string(),
                key: "name".to_string(),
            });
        }
    };
    match name.as_str() {
        "breakout" => {
            validate_non_negative_int(config, "strategy", "lookback")?;
            validate_non_negative_double(config, "strategy", "min_range")?;
            let confidence = config.get_double("strategy", "confidence", 0.0);
            if confidence >= 1.0 {
                return Err(TicksimError::ConfigInvalid {
                    section: "strategy".to_string(),
                    key: "confidence".to_string(),
                    reason: "confidence must be below 1".to_string(),
                });
            }
        }
        "mean_reversion" => {
            validate_non_negative_int(config, "strategy", "lookback")?;
            validate_non_negative_double(config, "strategy", "z_threshold")?;
        }
        "delta_trend" => {
            validate_non_negative_double(config, "strategy", "delta_threshold")?;
            validate_non_negative_double(config, "strategy", "profile_skew")?;
            validate_non_negative_double(config, "strategy", "min_volume")?;
        }
        _ => return Err(TicksimError::UnknownStrategy { name }),
    }
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    match config.get_string("engine", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TicksimError::ConfigMissing {
            section: "engine".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_tick_size(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    if config.get_string("engine", "tick_size").is_none() {
        return Err(TicksimError::ConfigMissing {
            section: "engine".to_string(),
            key: "tick_size".to_string(),
        });
    }
    let value = config.get_double("engine", "tick_size", 0.0);
    if value <= 0.0 {
        return Err(TicksimError::ConfigInvalid {
            section: "engine".to_string(),
            key: "tick_size".to_string(),
            reason: "tick_size must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_size(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    let value = config.get_int("engine", "size", 1);
    if value < 1 {
        return Err(TicksimError::ConfigInvalid {
            section: "engine".to_string(),
            key: "size".to_string(),
            reason: "size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_feature_window(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    validate_non_negative_int(config, "features", "window")
}

fn validate_daily_stop_loss(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    let value = config.get_double("risk", "daily_stop_loss", 0.0);
    if value > 0.0 {
        return Err(TicksimError::ConfigInvalid {
            section: "risk".to_string(),
            key: "daily_stop_loss".to_string(),
            reason: "daily_stop_loss must be zero or negative".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TicksimError> {
    if let Some(raw) = config.get_string(section, key)
        && raw.trim().parse::<i64>().map_or(true, |v| v < 0)
    {
        return Err(TicksimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a non-negative integer"),
        });
    }
    Ok(())
}

fn validate_non_negative_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TicksimError> {
    if let Some(raw) = config.get_string(section, key)
        && raw.trim().parse::<f64>().map_or(true, |v| v < 0.0 || v.is_nan())
    {
        return Err(TicksimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a non-negative number"),
        });
    }
    Ok(())
}
