//! The fixed set of data tabs on a ticker page.

/// A named data tab on a ticker's page.
///
/// Declaration order is the visit order: tabs are always walked in this
/// sequence so one page session serves the whole sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Overview,
    Valuation,
    Performance,
    Dividends,
    Profitability,
    Financials,
    Technicals,
}

impl Tab {
    /// All tabs in visit order.
    pub const ALL: [Tab; 7] = [
        Tab::Overview,
        Tab::Valuation,
        Tab::Performance,
        Tab::Dividends,
        Tab::Profitability,
        Tab::Financials,
        Tab::Technicals,
    ];

    /// DOM id of the tab's button element.
    pub fn button_id(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Valuation => "valuation",
            Tab::Performance => "performance",
            Tab::Dividends => "dividends",
            Tab::Profitability => "profitability",
            Tab::Financials => "financials",
            Tab::Technicals => "technicals",
        }
    }

    /// Human-readable tab name, also used as the sheet name.
    pub fn name(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Valuation => "Valuation",
            Tab::Performance => "Performance",
            Tab::Dividends => "Dividends",
            Tab::Profitability => "Profitability",
            Tab::Financials => "Financials",
            Tab::Technicals => "Technicals",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
