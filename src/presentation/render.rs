// Text renderers - Pure functions from state to console output
use crate::application::chart_series::ChartState;
use crate::application::dashboard_sync::DashboardState;
use std::fmt::Write;

pub fn render_dashboard(state: &DashboardState, authenticated: bool) -> String {
    let s = &state.snapshot;
    let mut out = String::new();

    if s.pub_status.is_open {
        let _ = writeln!(out, "Pub:         OPEN since {}", s.pub_status.opened_at);
    } else {
        let _ = writeln!(out, "Pub:         CLOSED since {}", s.pub_status.closed_at);
    }

    let low = if s.is_low { " (running low)" } else { "" };
    let _ = writeln!(out, "Beers left:  {}{}", s.beers_left, low);
    let _ = writeln!(out, "Active keg:  {} l", s.active_keg);

    if s.is_ok && !s.last_at.is_empty() {
        let _ = writeln!(
            out,
            "Scale:       {} kg ({} ago)",
            s.last_weight_formated, s.last_at_duration
        );
    }
    if s.beers_total > 0 {
        let _ = writeln!(out, "Total beers: {}", s.beers_total);
    }

    let stock: Vec<String> = s
        .warehouse
        .iter()
        .map(|entry| format!("{} l x{}", entry.keg, entry.amount))
        .collect();
    let _ = writeln!(out, "Warehouse:   {}", stock.join(", "));
    if s.warehouse_beer_left > 0 {
        let _ = writeln!(out, "In stock:    {} beers", s.warehouse_beer_left);
    }

    if s.is_offline() {
        let _ = writeln!(out, "Status:      OFFLINE");
    } else {
        let _ = writeln!(
            out,
            "Status:      OK ({} ago), WiFi {} dB",
            s.last_update_duration, s.rssi
        );
    }

    if authenticated {
        if let Some(bank) = s.bank_balance.as_ref().filter(|b| !b.balance.is_empty()) {
            let _ = writeln!(out, "Bank:        {} CZK", bank.balance);
        }
    } else {
        let _ = writeln!(out, "Protected panels are locked, enter `login <password>`");
    }
    if state.is_loading {
        let _ = writeln!(out, "(refreshing)");
    }

    out
}

pub fn render_chart(title: &str, state: &ChartState, stepped: bool) -> String {
    let Some(range) = state.selected_range else {
        return format!("{}: no range selected", title);
    };

    let loading = if state.is_loading { " (loading)" } else { "" };
    let Some(last) = state.points.last() else {
        return format!("{} [{}]: no data{}", title, range, loading);
    };

    let min = state
        .points
        .iter()
        .map(|p| p.value)
        .fold(f64::INFINITY, f64::min);
    let max = state
        .points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);

    let kind = if stepped { "steps" } else { "points" };
    format!(
        "{} [{}]: {} {}, latest {} at {} (min {}, max {}){}",
        title,
        range,
        state.points.len(),
        kind,
        last.value,
        last.label,
        min,
        max,
        loading
    )
}
