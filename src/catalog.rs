//! Game content rows as stored in the remote collections.
//!
//! These are the records the browsing screens page through and the admin
//! console edits. All of them serialize to the same JSON shape the hosted
//! backend returns, so a collection can be seeded from an export file.
//!
//! Purchasable rows (shop items, coin packages) may carry an
//! [`OfferWindow`]: a discount that applies until a stored expiry time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::paging::{Record, RowId};

/// A row the CLI can list.
pub trait Listing: Record {
    /// Primary display text.
    fn title(&self) -> &str;

    /// One-line secondary detail, evaluated at `now` for time-bound fields.
    fn detail(&self, now: DateTime<Utc>) -> String;
}

// ============================================================================
// Offer window
// ============================================================================

/// A time-bounded discount on a purchasable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferWindow {
    /// Percent off, 0-100. Values above 100 are treated as 100.
    pub discount_percent: u8,
    pub expires_at: DateTime<Utc>,
}

impl OfferWindow {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.discount_percent > 0 && now < self.expires_at
    }

    /// `price` after the discount, rounded to the nearest unit, or `price`
    /// unchanged once the window has closed.
    pub fn apply(&self, price: u32, now: DateTime<Utc>) -> u32 {
        if !self.is_active_at(now) {
            return price;
        }
        let keep = 100 - u64::from(self.discount_percent.min(100));
        ((u64::from(price) * keep + 50) / 100) as u32
    }

    /// Time left before expiry; `None` once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (now < self.expires_at).then(|| self.expires_at - now)
    }
}

fn price_with_offer(price: u32, offer: Option<&OfferWindow>, now: DateTime<Utc>) -> u32 {
    offer.map_or(price, |o| o.apply(price, now))
}

fn offer_suffix(offer: Option<&OfferWindow>, now: DateTime<Utc>) -> String {
    match offer {
        Some(o) if o.is_active_at(now) => {
            let hours = o.remaining(now).map_or(0, |d| d.num_hours());
            format!(" (-{}%, {}h left)", o.discount_percent.min(100), hours)
        }
        _ => String::new(),
    }
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: RowId,
    pub name: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Blurred data URI shown while `image_url` loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: RowId,
    pub name: String,
    /// List price in in-game coins.
    pub price_coins: u32,
    /// Remaining stock; `None` is unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<OfferWindow>,
}

impl ShopItem {
    pub fn price_at(&self, now: DateTime<Utc>) -> u32 {
        price_with_offer(self.price_coins, self.offer.as_ref(), now)
    }

    pub fn in_stock(&self) -> bool {
        self.stock != Some(0)
    }
}

/// Coins sold for real money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinPackage {
    pub id: RowId,
    pub name: String,
    pub coins: u32,
    #[serde(default)]
    pub bonus_coins: u32,
    /// Price in the smallest currency unit.
    pub price_cents: u32,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<OfferWindow>,
}

impl CoinPackage {
    pub fn total_coins(&self) -> u32 {
        self.coins.saturating_add(self.bonus_coins)
    }

    pub fn price_at(&self, now: DateTime<Utc>) -> u32 {
        price_with_offer(self.price_cents, self.offer.as_ref(), now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prize {
    Coins { amount: u32 },
    Item { item_id: RowId },
    Coupon { code: String },
    Nothing,
}

/// One segment of the fortune wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelReward {
    pub id: RowId,
    pub label: String,
    pub prize: Prize,
    /// Relative odds against the other segments.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl WheelReward {
    /// Chance of landing on this segment given the whole wheel.
    pub fn odds(&self, wheel: &[WheelReward]) -> f64 {
        let total: u64 = wheel.iter().map(|r| u64::from(r.weight)).sum();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.weight) / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: RowId,
    pub code: String,
    pub discount_percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub redeemed: bool,
}

impl Coupon {
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        !self.redeemed && self.expires_at.is_none_or(|t| now < t)
    }
}

// ============================================================================
// Trait impls
// ============================================================================

macro_rules! impl_record {
    ($($ty:ty),+) => {
        $(impl Record for $ty {
            fn id(&self) -> RowId {
                self.id
            }
        })+
    };
}

impl_record!(Character, ShopItem, CoinPackage, WheelReward, Coupon);

impl Listing for Character {
    fn title(&self) -> &str {
        &self.name
    }

    fn detail(&self, _now: DateTime<Utc>) -> String {
        format!("{:?}", self.rarity).to_lowercase()
    }
}

impl Listing for ShopItem {
    fn title(&self) -> &str {
        &self.name
    }

    fn detail(&self, now: DateTime<Utc>) -> String {
        let stock = match self.stock {
            Some(0) => ", sold out".to_string(),
            Some(n) => format!(", {n} left"),
            None => String::new(),
        };
        format!(
            "{} coins{}{}",
            self.price_at(now),
            offer_suffix(self.offer.as_ref(), now),
            stock
        )
    }
}

impl Listing for CoinPackage {
    fn title(&self) -> &str {
        &self.name
    }

    fn detail(&self, now: DateTime<Utc>) -> String {
        let price = self.price_at(now);
        format!(
            "{} coins for {}.{:02} {}{}",
            self.total_coins(),
            price / 100,
            price % 100,
            self.currency,
            offer_suffix(self.offer.as_ref(), now)
        )
    }
}

impl Listing for WheelReward {
    fn title(&self) -> &str {
        &self.label
    }

    fn detail(&self, _now: DateTime<Utc>) -> String {
        let prize = match &self.prize {
            Prize::Coins { amount } => format!("{amount} coins"),
            Prize::Item { item_id } => format!("item #{item_id}"),
            Prize::Coupon { code } => format!("coupon {code}"),
            Prize::Nothing => "nothing".to_string(),
        };
        format!("{prize}, weight {}", self.weight)
    }
}

impl Listing for Coupon {
    fn title(&self) -> &str {
        &self.code
    }

    fn detail(&self, now: DateTime<Utc>) -> String {
        let status = if self.redeemed {
            "redeemed"
        } else if self.is_redeemable_at(now) {
            "available"
        } else {
            "expired"
        };
        format!("-{}%, {status}", self.discount_percent)
    }
}
