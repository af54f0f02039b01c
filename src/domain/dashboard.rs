// Dashboard domain model - The complete point-in-time scale snapshot
use serde::Deserialize;

/// Keg sizes the warehouse tracks, in litres, in display order.
pub const WAREHOUSE_KEGS: [u32; 5] = [10, 15, 20, 30, 50];

/// Wire envelope of `GET /api/scale/dashboard`.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardDocument {
    pub scale: DashboardSnapshot,
}

/// Read-only dashboard value object. It is only ever replaced as a whole,
/// either by a freshly decoded document or by [`DashboardSnapshot::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardSnapshot {
    pub is_ok: bool,
    pub beers_left: i64,
    #[serde(default)]
    pub beers_total: i64,
    pub last_weight: f64,
    pub last_weight_formated: String,
    pub last_at: String,
    pub last_at_duration: String,
    pub rssi: f64,
    pub last_update: String,
    pub last_update_duration: String,
    #[serde(rename = "pub")]
    pub pub_status: PubStatus,
    pub active_keg: u32,
    pub is_low: bool,
    pub warehouse: Vec<WarehouseEntry>,
    pub warehouse_beer_left: i64,
    // Only served to authorized callers
    #[serde(default)]
    pub bank_balance: Option<BankBalance>,
    #[serde(default)]
    pub bank_transactions: Vec<BankTransaction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PubStatus {
    pub is_open: bool,
    pub opened_at: String,
    pub closed_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WarehouseEntry {
    pub keg: u32,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BankBalance {
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BankTransaction {
    pub date: String,
    pub amount: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub bank_code: String,
    #[serde(default)]
    pub recipient_message: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub user_identification: String,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            is_ok: false,
            beers_left: 0,
            beers_total: 0,
            last_weight: 0.0,
            last_weight_formated: "0.0".to_string(),
            last_at: "0".to_string(),
            last_at_duration: "0".to_string(),
            rssi: 0.0,
            last_update: "0".to_string(),
            last_update_duration: "0".to_string(),
            pub_status: PubStatus {
                is_open: false,
                opened_at: "0".to_string(),
                closed_at: "0".to_string(),
            },
            active_keg: 0,
            is_low: false,
            warehouse: WAREHOUSE_KEGS
                .iter()
                .map(|&keg| WarehouseEntry { keg, amount: 0 })
                .collect(),
            warehouse_beer_left: 0,
            bank_balance: None,
            bank_transactions: Vec::new(),
        }
    }
}

impl DashboardSnapshot {
    /// The view shows the service as offline whenever this is true.
    pub fn is_offline(&self) -> bool {
        !self.is_ok
    }
}
