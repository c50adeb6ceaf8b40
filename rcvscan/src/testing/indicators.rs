use mockall::mock;
use rstest::fixture;

use crate::Indicator;

mock! {
    pub IndicatorLookup {

    }

    impl crate::IndicatorLookup for IndicatorLookup {
        fn check_app_id(&self, app_id: &str) -> crate::Result<Option<Indicator>>;
    }
}

#[fixture]
pub fn mock_lookup() -> MockIndicatorLookup {
    MockIndicatorLookup::new()
}
