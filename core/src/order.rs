//! Order input: the data carried by a create-order request, its pre-flight
//! validation, and its flat form encoding.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidOrder;

/// Delivery services accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCode {
    FedexOvernight,
    UspsPriorityExpress,
    UspsPriority,
    UspsCertifiedPhysicalReceipt,
    UspsCertifiedReceipt,
    UspsCertified,
    UspsFirstClass,
    UspsStandard,
    UspsPostcard,
}

impl ServiceCode {
    pub const ALL: [ServiceCode; 9] = [
        ServiceCode::FedexOvernight,
        ServiceCode::UspsPriorityExpress,
        ServiceCode::UspsPriority,
        ServiceCode::UspsCertifiedPhysicalReceipt,
        ServiceCode::UspsCertifiedReceipt,
        ServiceCode::UspsCertified,
        ServiceCode::UspsFirstClass,
        ServiceCode::UspsStandard,
        ServiceCode::UspsPostcard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceCode::FedexOvernight => "FEDEX_OVERNIGHT",
            ServiceCode::UspsPriorityExpress => "USPS_PRIORITY_EXPRESS",
            ServiceCode::UspsPriority => "USPS_PRIORITY",
            ServiceCode::UspsCertifiedPhysicalReceipt => "USPS_CERTIFIED_PHYSICAL_RECEIPT",
            ServiceCode::UspsCertifiedReceipt => "USPS_CERTIFIED_RECEIPT",
            ServiceCode::UspsCertified => "USPS_CERTIFIED",
            ServiceCode::UspsFirstClass => "USPS_FIRST_CLASS",
            ServiceCode::UspsStandard => "USPS_STANDARD",
            ServiceCode::UspsPostcard => "USPS_POSTCARD",
        }
    }

    /// All codes rendered as `[A B C]`, as used in validation messages.
    pub fn list() -> String {
        let codes: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
        format!("[{}]", codes.join(" "))
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCode {
    type Err = InvalidOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| InvalidOrder::UnsupportedService(s.to_string()))
    }
}

/// Input for creating an order.
///
/// Either `file_path` or `url` names the PDF to mail. When both are set the
/// file is uploaded and `url` is still sent; the service ignores `url` in
/// that case, it is not stripped client-side.
///
/// Zero `amount` and `check_number` mean "no check".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderInput {
    /// Local path of the PDF, uploaded as the `file` part.
    pub file_path: Option<PathBuf>,
    /// URL the service downloads the PDF from.
    pub url: String,
    pub customer_reference: String,
    /// One of the `ServiceCode` names.
    pub service: String,
    /// Receives notifications about updates to this order.
    pub webhook: String,
    pub company: String,
    /// Print one page per sheet.
    pub simplex: bool,
    pub color: bool,
    /// Mail in a flat envelope instead of folded.
    pub flat: bool,
    /// Use a real postage stamp instead of metered postage.
    pub stamp: bool,
    /// Text for the non-picture side of a postcard.
    pub message: String,

    pub to_name: String,
    pub to_organization: String,
    pub to_address1: String,
    pub to_address2: String,
    pub to_city: String,
    pub to_state: String,
    pub to_postcode: String,
    pub to_country: String,

    pub from_name: String,
    pub from_organization: String,
    pub from_address1: String,
    pub from_address2: String,
    pub from_city: String,
    pub from_state: String,
    pub from_postcode: String,
    pub from_country: String,

    pub bank_account: String,
    /// Check amount in cents.
    pub amount: u64,
    pub check_name: String,
    pub check_number: u64,
    pub check_memo: String,
}

impl OrderInput {
    /// Check the service code and the required address fields.
    ///
    /// Reports the first failure in this order: service, then
    /// `To{Name, Address1, City, State, Postcode, Country}`, then the same
    /// fields for `From`.
    pub fn validate(&self) -> Result<(), InvalidOrder> {
        self.service.parse::<ServiceCode>()?;

        let required = [
            ("ToName", &self.to_name),
            ("ToAddress1", &self.to_address1),
            ("ToCity", &self.to_city),
            ("ToState", &self.to_state),
            ("ToPostcode", &self.to_postcode),
            ("ToCountry", &self.to_country),
            ("FromName", &self.from_name),
            ("FromAddress1", &self.from_address1),
            ("FromCity", &self.from_city),
            ("FromState", &self.from_state),
            ("FromPostcode", &self.from_postcode),
            ("FromCountry", &self.from_country),
        ];
        match required.into_iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(InvalidOrder::MissingField(field)),
            None => Ok(()),
        }
    }

    /// Flatten the input into the form fields of a create-order request.
    ///
    /// Delivery and address fields are always present, even when empty.
    /// `url` and the check fields are only present when set. `file_path` is
    /// never part of the form; it travels as a separate file part.
    pub fn form_data(&self) -> BTreeMap<String, String> {
        let mut form: BTreeMap<String, String> = [
            ("customer_reference", self.customer_reference.clone()),
            ("service", self.service.clone()),
            ("webhook", self.webhook.clone()),
            ("company", self.company.clone()),
            ("simplex", self.simplex.to_string()),
            ("color", self.color.to_string()),
            ("flat", self.flat.to_string()),
            ("stamp", self.stamp.to_string()),
            ("message", self.message.clone()),
            ("to.name", self.to_name.clone()),
            ("to.organization", self.to_organization.clone()),
            ("to.address1", self.to_address1.clone()),
            ("to.address2", self.to_address2.clone()),
            ("to.city", self.to_city.clone()),
            ("to.state", self.to_state.clone()),
            ("to.postcode", self.to_postcode.clone()),
            ("to.country", self.to_country.clone()),
            ("from.name", self.from_name.clone()),
            ("from.organization", self.from_organization.clone()),
            ("from.address1", self.from_address1.clone()),
            ("from.address2", self.from_address2.clone()),
            ("from.city", self.from_city.clone()),
            ("from.state", self.from_state.clone()),
            ("from.postcode", self.from_postcode.clone()),
            ("from.country", self.from_country.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let optional = [
            ("url", self.url.clone()),
            ("bank_account", self.bank_account.clone()),
            ("amount", nonzero(self.amount)),
            ("check_name", self.check_name.clone()),
            ("check_number", nonzero(self.check_number)),
            ("check_memo", self.check_memo.clone()),
        ];
        for (key, value) in optional {
            if !value.is_empty() {
                form.insert(key.to_string(), value);
            }
        }

        form
    }
}

fn nonzero(n: u64) -> String {
    if n == 0 {
        String::new()
    } else {
        n.to_string()
    }
}
