use crate::domain::models::AddressInfo;

/// Inclusion rule for a tracked country that is only partially in scope.
///
/// A record matches when its state/province contains `state_marker`, or its
/// town contains any of `towns`. Both checks are case-insensitive substring
/// matches so spelling variants ("Banja Luka - Centar") still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRegionRule {
    pub name: &'static str,
    pub country_code: &'static str,
    pub state_marker: &'static str,
    pub towns: &'static [&'static str],
}

pub const REPUBLIKA_SRPSKA: SubRegionRule = SubRegionRule {
    name: "Republika Srpska",
    country_code: "BA",
    state_marker: "srpska",
    towns: &[
        "Banja Luka",
        "Bijeljina",
        "Prijedor",
        "Doboj",
        "Trebinje",
        "Zvornik",
        "Gradiška",
        "Laktaši",
        "Istočno Sarajevo",
        "Pale",
        "Foča",
        "Višegrad",
        "Derventa",
        "Modriča",
        "Prnjavor",
        "Mrkonjić Grad",
        "Bileća",
        "Rogatica",
        "Sokolac",
        "Šipovo",
        "Čelinac",
        "Bratunac",
        "Kozarska Dubica",
        "Novi Grad",
        "Teslić",
        "Brod",
        "Šamac",
        "Ugljevik",
        "Vlasenica",
        "Nevesinje",
        "Brčko",
        "Brcko",
        "Dabrac",
        "Jahorina",
    ],
};

const SUB_REGION_RULES: &[SubRegionRule] = &[REPUBLIKA_SRPSKA];

pub fn region_rule_for(country_code: &str) -> Option<&'static SubRegionRule> {
    SUB_REGION_RULES
        .iter()
        .find(|rule| rule.country_code.eq_ignore_ascii_case(country_code))
}

impl SubRegionRule {
    pub fn includes(&self, address: &AddressInfo) -> bool {
        let state = address
            .state_or_province
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if state.contains(self.state_marker) {
            return true;
        }

        let town = address.town.as_deref().unwrap_or_default().to_lowercase();
        self.towns
            .iter()
            .any(|candidate| town.contains(&candidate.to_lowercase()))
    }
}

/// Records of countries without a sub-region rule are always in scope.
pub fn include_record(country_code: &str, address: &AddressInfo) -> bool {
    region_rule_for(country_code).is_none_or(|rule| rule.includes(address))
}
