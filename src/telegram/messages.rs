//! User-facing message text.

use crate::models::{Side, Signal};

/// Render a signal for delivery
pub fn format_signal(signal: &Signal, symbol: &str) -> String {
    let mut lines = vec![
        format!("📊 {} signal", symbol),
        format!("Side: {}", signal.side.as_str()),
        format!("Price: {} USD", signal.price),
        format!("Confidence: {}%", (signal.confidence * 100.0).round() as i64),
    ];

    if let (Some(sl), Some(tp)) = (signal.stop_loss, signal.take_profit) {
        lines.push(format!("Stop loss (SL): {}", sl));
        lines.push(format!("Take profit (TP): {}", tp));
    }

    if signal.side == Side::Hold {
        lines.push("No actionable setup right now.".to_string());
    }

    lines.push(format!(
        "Generated at: {}",
        signal.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    lines.join("\n")
}

pub fn welcome(symbol: &str, interval_min: u64) -> String {
    format!(
        "Welcome to the {symbol} signal bot 🟡\n\
         Commands:\n\
         /signal - get a fresh signal now\n\
         /subscribe - receive signals automatically every {interval_min} minutes\n\
         /unsubscribe - stop automatic signals\n\
         /help - show this list\n\
         Note: this is a demo bot. Signals are not investment advice."
    )
}

pub fn help() -> String {
    "/signal, /subscribe, /unsubscribe".to_string()
}

pub fn subscribed(interval_min: u64) -> String {
    format!("✅ Subscribed. You will receive signals every {interval_min} minutes.")
}

pub fn already_subscribed() -> String {
    "You are already subscribed.".to_string()
}

pub fn unsubscribed() -> String {
    "✅ Unsubscribed.".to_string()
}

pub fn not_subscribed() -> String {
    "You are not subscribed.".to_string()
}

pub fn unknown_command() -> String {
    "Unknown command. Use /help.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    #[test]
    fn actionable_signal_renders_risk_levels() {
        let signal = Signal {
            side: Side::Buy,
            price: 2002.0,
            confidence: 0.75,
            stop_loss: Some(1991.99),
            take_profit: Some(2042.04),
            generated_at: Utc::now(),
        };

        let text = format_signal(&signal, "XAUUSD");

        assert!(text.contains("XAUUSD"));
        assert!(text.contains("Side: BUY"));
        assert!(text.contains("Price: 2002 USD"));
        assert!(text.contains("Confidence: 75%"));
        assert!(text.contains("Stop loss (SL): 1991.99"));
        assert!(text.contains("Take profit (TP): 2042.04"));
    }

    #[test]
    fn hold_signal_renders_without_risk_levels() {
        let signal = Signal {
            side: Side::Hold,
            price: 2000.0,
            confidence: 0.15,
            stop_loss: None,
            take_profit: None,
            generated_at: Utc::now(),
        };

        let text = format_signal(&signal, "XAUUSD");

        assert!(text.contains("Side: HOLD"));
        assert!(!text.contains("Stop loss"));
        assert!(!text.contains("Take profit"));
    }
}
