//! Outbound requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use satchel_inventory::ContainerKind;

use super::operation;

/// How a purchase is paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on hand.
    #[default]
    Cash,
    /// Bank account.
    Bank,
}

/// Generic transfer between two slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Source slot.
    pub from_slot: u32,
    /// Source container kind.
    pub from_type: ContainerKind,
    /// Destination slot.
    pub to_slot: u32,
    /// Destination container kind.
    pub to_type: ContainerKind,
    /// Units moved.
    pub count: u32,
    /// Source container id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_inventory: Option<String>,
    /// Destination container id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_inventory: Option<String>,
}

/// Shop purchase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Shop slot.
    pub from_slot: u32,
    /// Shop kind.
    pub from_type: ContainerKind,
    /// Player slot receiving the item.
    pub to_slot: u32,
    /// Player container kind.
    pub to_type: ContainerKind,
    /// Units bought.
    pub count: u32,
    /// Payment method.
    pub payment: PaymentMethod,
}

/// Craft enqueue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftRequest {
    /// Bench container id.
    pub bench_id: String,
    /// Bench index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench_index: Option<u32>,
    /// Recipe slot on the bench.
    pub recipe_slot: u32,
    /// Storage container the ingredients come from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    /// Units to craft.
    pub count: u32,
    /// Player slot receiving the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_slot: Option<u32>,
}

/// Craft cancellation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelCraftRequest {
    /// Bench container id.
    pub bench_id: String,
    /// 1-based queue position.
    pub job_index: u32,
}

/// Move out of the utility strip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityReleaseRequest {
    /// Strip position.
    pub utility_slot: u32,
    /// Player slot receiving the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_slot: Option<u32>,
}

/// Move into the utility strip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityAssignRequest {
    /// Strip position.
    pub utility_slot: u32,
    /// Player slot the item comes from.
    pub from_slot: u32,
}

/// Any outbound request.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// `swapItems`
    Transfer(TransferRequest),
    /// `buyItem`
    Purchase(PurchaseRequest),
    /// `craftItem`
    Craft(CraftRequest),
    /// `cancelCraft`
    CancelCraft(CancelCraftRequest),
    /// `moveFromUtilitySlot`
    ReleaseUtility(UtilityReleaseRequest),
    /// `moveToUtilitySlot`
    AssignUtility(UtilityAssignRequest),
}

impl Request {
    /// Operation name on the wire.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Transfer(_) => operation::SWAP_ITEMS,
            Self::Purchase(_) => operation::BUY_ITEM,
            Self::Craft(_) => operation::CRAFT_ITEM,
            Self::CancelCraft(_) => operation::CANCEL_CRAFT,
            Self::ReleaseUtility(_) => operation::MOVE_FROM_UTILITY,
            Self::AssignUtility(_) => operation::MOVE_TO_UTILITY,
        }
    }

    /// JSON payload.
    #[must_use]
    pub fn payload(&self) -> Value {
        let encoded = match self {
            Self::Transfer(body) => serde_json::to_value(body),
            Self::Purchase(body) => serde_json::to_value(body),
            Self::Craft(body) => serde_json::to_value(body),
            Self::CancelCraft(body) => serde_json::to_value(body),
            Self::ReleaseUtility(body) => serde_json::to_value(body),
            Self::AssignUtility(body) => serde_json::to_value(body),
        };
        encoded.unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transfer_payload_is_camel_case() {
        let request = Request::Transfer(TransferRequest {
            from_slot: 10,
            from_type: ContainerKind::Player,
            to_slot: 2,
            to_type: ContainerKind::Other("stash".into()),
            count: 2,
            from_inventory: Some("char-1".into()),
            to_inventory: None,
        });
        assert_eq!(request.operation(), "swapItems");
        assert_eq!(
            request.payload(),
            json!({
                "fromSlot": 10, "fromType": "player", "toSlot": 2, "toType": "stash",
                "count": 2, "fromInventory": "char-1",
            })
        );
    }

    #[test]
    fn test_purchase_payment_names() {
        let request = Request::Purchase(PurchaseRequest {
            from_slot: 1,
            from_type: ContainerKind::Shop,
            to_slot: 4,
            to_type: ContainerKind::Player,
            count: 1,
            payment: PaymentMethod::Bank,
        });
        assert_eq!(request.payload()["payment"], json!("bank"));
    }

    #[test]
    fn test_fire_and_forget_requests() {
        let cancel = Request::CancelCraft(CancelCraftRequest {
            bench_id: "bench-1".into(),
            job_index: 2,
        });
        assert_eq!(cancel.payload(), json!({ "benchId": "bench-1", "jobIndex": 2 }));

        let release = Request::ReleaseUtility(UtilityReleaseRequest {
            utility_slot: 3,
            to_slot: None,
        });
        assert_eq!(release.operation(), "moveFromUtilitySlot");
        assert_eq!(release.payload(), json!({ "utilitySlot": 3 }));
    }
}
