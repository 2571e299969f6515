//! Asaas wire types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loyalty_core::gateway::{Charge, PixPayload};
use shared::money::Money;

/// Paged list envelope (`{"data": [...]}`)
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerDto {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePaymentBody<'a> {
    pub customer: &'a str,
    pub billing_type: &'a str,
    /// Asaas expects a JSON number here
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub value: Decimal,
    #[serde(with = "iso_date")]
    pub due_date: NaiveDate,
    pub description: &'a str,
    pub external_reference: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentDto {
    pub id: String,
    #[serde(default)]
    pub status: String,
    pub value: Decimal,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl From<PaymentDto> for Charge {
    fn from(dto: PaymentDto) -> Self {
        Charge {
            id: dto.id,
            status: dto.status,
            amount: Money::new(dto.value),
            checkout_url: dto.invoice_url.filter(|u| !u.is_empty()),
            external_reference: dto.external_reference,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PixQrCodeDto {
    #[serde(default)]
    pub encoded_image: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

impl From<PixQrCodeDto> for PixPayload {
    fn from(dto: PixQrCodeDto) -> Self {
        PixPayload {
            qr_image_base64: dto.encoded_image,
            qr_text: dto.payload,
            expires_at: dto.expiration_date,
        }
    }
}

/// `{"errors": [{"code": "...", "description": "..."}]}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorItem {
    #[serde(default)]
    pub description: String,
}

impl ErrorBody {
    pub fn descriptions(self) -> Vec<String> {
        self.errors
            .into_iter()
            .map(|e| e.description)
            .filter(|d| !d.trim().is_empty())
            .collect()
    }
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }
}
