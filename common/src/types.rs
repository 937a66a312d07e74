//! Domain enums for orders and escrow records
//!
//! Statuses are persisted as TEXT columns, so every enum carries a stable
//! `as_str` representation plus `FromStr` for the inbound direction.

use serde::{Deserialize, Serialize};

// ============================================================================
// Order Types
// ============================================================================

/// Direction of a barter listing from the creator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    /// Creator is offering goods and looking for something in return.
    Sell,
    /// Creator is seeking goods and offering something in return.
    Buy,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Sell => "SELL",
            TradeDirection::Buy => "BUY",
        }
    }
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TradeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SELL" => Ok(TradeDirection::Sell),
            "BUY" => Ok(TradeDirection::Buy),
            _ => Err(format!("Unknown trade direction: {s}")),
        }
    }
}

/// Lifecycle status of an order.
///
/// The order endpoints only ever move PENDING → ACCEPTED → COMPLETED
/// (plus deletion of a PENDING order). CANCELLED and DISPUTED exist for
/// escrow-originated events and are terminal once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
    Disputed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Disputed => "DISPUTED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "ACCEPTED" => Ok(OrderStatus::Accepted),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "DISPUTED" => Ok(OrderStatus::Disputed),
            _ => Err(format!("Unknown order status: {s}")),
        }
    }
}

/// Which side of the trade an order item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemSide {
    Offering,
    Requesting,
}

impl ItemSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSide::Offering => "OFFERING",
            ItemSide::Requesting => "REQUESTING",
        }
    }
}

impl std::fmt::Display for ItemSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFERING" => Ok(ItemSide::Offering),
            "REQUESTING" => Ok(ItemSide::Requesting),
            _ => Err(format!("Unknown item side: {s}")),
        }
    }
}

// ============================================================================
// Escrow Types
// ============================================================================

/// Lifecycle status of an escrow record.
///
/// The server only walks PENDING → FUNDED → ACCEPTED → COMPLETED.
/// CANCELLED and DISPUTED mirror contract states with no transition
/// endpoint in this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowStatus {
    Pending,
    Funded,
    Accepted,
    Completed,
    Cancelled,
    Disputed,
}

impl EscrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Pending => "PENDING",
            EscrowStatus::Funded => "FUNDED",
            EscrowStatus::Accepted => "ACCEPTED",
            EscrowStatus::Completed => "COMPLETED",
            EscrowStatus::Cancelled => "CANCELLED",
            EscrowStatus::Disputed => "DISPUTED",
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EscrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(EscrowStatus::Pending),
            "FUNDED" => Ok(EscrowStatus::Funded),
            "ACCEPTED" => Ok(EscrowStatus::Accepted),
            "COMPLETED" => Ok(EscrowStatus::Completed),
            "CANCELLED" => Ok(EscrowStatus::Cancelled),
            "DISPUTED" => Ok(EscrowStatus::Disputed),
            _ => Err(format!("Unknown escrow status: {s}")),
        }
    }
}

/// Asset class held by the escrow contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "ERC20")]
    Erc20,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Eth => "ETH",
            AssetType::Erc20 => "ERC20",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ETH" => Ok(AssetType::Eth),
            "ERC20" => Ok(AssetType::Erc20),
            _ => Err(format!("Unknown asset type: {s}")),
        }
    }
}
