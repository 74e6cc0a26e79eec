use crate::Amount;

/// Price breakdown of a stay, as shown before the reservation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Number of calendar days charged, start and end included.
    pub nights: u32,
    pub subtotal: Amount,
    pub discount: Amount,
    pub total: Amount,
}

impl Quote {
    pub fn new(nights: u32, subtotal: Amount, discount_percent: Option<u8>) -> Self {
        let total = match discount_percent {
            Some(percent) => subtotal.percent_off(percent),
            None => subtotal,
        };
        Self {
            nights,
            subtotal,
            discount: subtotal - total,
            total,
        }
    }

    pub fn is_discounted(&self) -> bool {
        self.discount.is_positive()
    }
}
