use std::path::Path;

use crate::adb::Adb;
use crate::utils::read_file;
use crate::{IndicatorLookup, SensitiveIntent};

use super::parser::parse_receiver_resolver_table;
use super::table::{Detection, ReceiverRecord, ReceiverTable};

/// Which receivers of an intent get checked against the indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Only the last receiver listed for each intent. This is how the check
    /// has always behaved, so it stays the default.
    #[default]
    LastReceiver,
    /// Every receiver of every intent
    EveryReceiver,
}

/// A receiver registered for one of the [SensitiveIntent]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub intent: SensitiveIntent,
    pub receiver: String,
}

impl Finding {
    pub fn message(&self) -> String {
        self.intent.finding(&self.receiver)
    }
}

/// Extracts receivers for risky broadcasts and checks them against indicators.
///
/// Every instance owns its own results, findings and detections.
#[derive(Debug, Default)]
pub struct DumpsysReceivers {
    mode: MatchMode,
    results: ReceiverTable,
    findings: Vec<Finding>,
    detected: Vec<Detection>,
}

impl DumpsysReceivers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: ReceiverTable) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn results(&self) -> &ReceiverTable {
        &self.results
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn detected(&self) -> &[Detection] {
        &self.detected
    }

    /// Replace the results with the receivers parsed from `dumpsys package` output
    pub fn parse(&mut self, output: &str) -> crate::Result<()> {
        self.results = parse_receiver_resolver_table(output)?;
        Ok(())
    }

    /// Pull `dumpsys package` from the device and parse it
    pub fn run(&mut self, adb: &dyn Adb) -> crate::Result<()> {
        adb.connect()?;
        let output = adb.dumpsys("package");
        let res = output.and_then(|out| self.parse(&out));
        adb.disconnect();
        res
    }

    /// Parse a saved `dumpsys package` output
    pub fn run_from_file(&mut self, path: &Path) -> crate::Result<()> {
        log::info!("parsing receivers from {}", path.to_string_lossy());
        let output = read_file(path)?;
        self.parse(&output)
    }

    /// Check the parsed receivers against the given indicators.
    ///
    /// Logs a finding for every receiver of a sensitive intent. Matches are
    /// annotated in the results and appended to the detections, which are
    /// returned. A lookup error stops the check and is returned as is.
    pub fn check_indicators(
        &mut self,
        lookup: &dyn IndicatorLookup,
    ) -> crate::Result<&[Detection]> {
        for (intent, receivers) in self.results.iter_mut() {
            match SensitiveIntent::from_action(intent) {
                Some(sensitive) => {
                    for receiver in receivers.iter() {
                        let finding = Finding {
                            intent: sensitive,
                            receiver: receiver.receiver.clone(),
                        };
                        log::info!("{}", finding.message());
                        self.findings.push(finding);
                    }
                }
                None if !receivers.is_empty() => {
                    log::debug!(
                        "untracked intent {} with {} receivers",
                        intent,
                        receivers.len()
                    );
                }
                None => {}
            }

            // NOTE: in LastReceiver mode the earlier receivers of an intent are
            // never looked up, a match on any of them goes unreported.
            let to_check: &mut [ReceiverRecord] = match self.mode {
                MatchMode::LastReceiver => {
                    let start = receivers.len().saturating_sub(1);
                    &mut receivers[start..]
                }
                MatchMode::EveryReceiver => &mut receivers[..],
            };

            for receiver in to_check.iter_mut() {
                if let Some(ioc) = lookup.check_app_id(&receiver.package)? {
                    log::warn!(
                        "receiver {} for {} matched indicator {} ({})",
                        receiver.receiver,
                        intent,
                        ioc.value,
                        ioc.name
                    );
                    receiver.matched_indicator = Some(ioc);
                    self.detected
                        .push(Detection::new(intent.clone(), receiver.clone()));
                }
            }
        }

        Ok(&self.detected)
    }

    /// Run a fresh check over `table` and return only the detections
    pub fn check(
        table: ReceiverTable,
        lookup: &dyn IndicatorLookup,
    ) -> crate::Result<Vec<Detection>> {
        let mut module = Self::with_results(table);
        module.check_indicators(lookup)?;
        Ok(module.detected)
    }
}

#[cfg(test)]
mod test {
    use mockall::predicate::eq;

    use super::*;
    use crate::testing::{cmd_output, mock_adb, mock_lookup, MockAdb, MockIndicatorLookup};
    use crate::intent::{INTENT_NEW_OUTGOING_SMS, INTENT_PHONE_STATE};
    use crate::{Indicator, Indicators};
    use rstest::*;

    fn indicator(value: &str) -> Indicator {
        Indicator {
            value: value.into(),
            kind: "app_ids".into(),
            name: "test".into(),
            stix2_file_name: "test.stix2".into(),
        }
    }

    fn table(entries: &[(&str, &[&str])]) -> ReceiverTable {
        let mut table = ReceiverTable::new();
        for (intent, receivers) in entries {
            table.insert(
                (*intent).into(),
                receivers
                    .iter()
                    .map(|it| ReceiverRecord::from_component(it).expect("valid component"))
                    .collect(),
            );
        }
        table
    }

    #[rstest]
    fn test_outgoing_call_detection(mut mock_lookup: MockIndicatorLookup) {
        mock_lookup
            .expect_check_app_id()
            .with(eq("com.example.spy"))
            .times(1)
            .returning(|id| Ok(Some(indicator(id))));

        let mut module = DumpsysReceivers::with_results(table(&[(
            "android.intent.action.NEW_OUTGOING_CALL",
            &["com.example.spy/.Calls"],
        )]));

        let detected = module.check_indicators(&mock_lookup).expect("check");
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].intent, "android.intent.action.NEW_OUTGOING_CALL");
        assert_eq!(
            detected[0].receiver.matched_indicator,
            Some(indicator("com.example.spy"))
        );

        assert_eq!(module.findings().len(), 1);
        assert_eq!(
            module.findings()[0].message(),
            "Found a receiver monitoring outgoing calls: \"com.example.spy/.Calls\""
        );

        // The table entry is annotated too
        let rec = &module.results()["android.intent.action.NEW_OUTGOING_CALL"][0];
        assert_eq!(rec.matched_indicator, Some(indicator("com.example.spy")));
    }

    #[rstest]
    fn test_empty_receivers(mut mock_lookup: MockIndicatorLookup) {
        mock_lookup.expect_check_app_id().never();

        let mut module =
            DumpsysReceivers::with_results(table(&[("android.intent.action.PHONE_STATE", &[])]));
        let detected = module.check_indicators(&mock_lookup).expect("check");
        assert!(detected.is_empty());
        assert!(module.findings().is_empty());
    }

    #[rstest]
    fn test_only_last_receiver_checked(mut mock_lookup: MockIndicatorLookup) {
        mock_lookup
            .expect_check_app_id()
            .with(eq("com.android.mms"))
            .times(1)
            .returning(|_| Ok(None));
        mock_lookup
            .expect_check_app_id()
            .with(eq("com.example.spy"))
            .never();

        let mut module = DumpsysReceivers::with_results(table(&[(
            "android.provider.Telephony.SMS_RECEIVED",
            &["com.example.spy/.Sms", "com.android.mms/.Sms"],
        )]));

        let detected = module.check_indicators(&mock_lookup).expect("check");
        assert!(detected.is_empty());
        assert_eq!(module.findings().len(), 2);
    }

    #[rstest]
    fn test_every_receiver_checked() {
        let iocs = Indicators::from_app_ids("test", ["com.example.spy"]);
        let mut module = DumpsysReceivers::with_results(table(&[(
            "android.provider.Telephony.SMS_RECEIVED",
            &["com.example.spy/.Sms", "com.android.mms/.Sms"],
        )]))
        .with_mode(MatchMode::EveryReceiver);

        let detected = module.check_indicators(&iocs).expect("check");
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].receiver.receiver, "com.example.spy/.Sms");
        assert!(module.results()["android.provider.Telephony.SMS_RECEIVED"][1]
            .matched_indicator
            .is_none());
    }

    #[rstest]
    fn test_untracked_intent_still_checked() {
        let iocs = Indicators::from_app_ids("test", ["com.example.spy"]);
        let mut module = DumpsysReceivers::with_results(table(&[(
            "android.intent.action.BOOT_COMPLETED",
            &["com.example.spy/.Boot"],
        )]));

        let detected = module.check_indicators(&iocs).expect("check");
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].intent, "android.intent.action.BOOT_COMPLETED");
        assert!(module.findings().is_empty());
    }

    #[rstest]
    fn test_lookup_error_aborts(mut mock_lookup: MockIndicatorLookup) {
        mock_lookup
            .expect_check_app_id()
            .with(eq("com.a"))
            .times(1)
            .returning(|id| Ok(Some(indicator(id))));
        mock_lookup
            .expect_check_app_id()
            .with(eq("com.b"))
            .times(1)
            .returning(|_| Err(crate::Error::new_generic("indicator db gone")));
        mock_lookup
            .expect_check_app_id()
            .with(eq("com.c"))
            .never();

        let mut module = DumpsysReceivers::with_results(table(&[
            ("android.intent.action.PHONE_STATE", &["com.a/.A"]),
            ("android.intent.action.NEW_OUTGOING_CALL", &["com.b/.B"]),
            ("android.provider.Telephony.SMS_RECEIVED", &["com.c/.C"]),
        ]));

        let res = module.check_indicators(&mock_lookup);
        assert!(matches!(res, Err(crate::Error::Generic(_))));
        // Detections made before the failure are kept
        assert_eq!(module.detected().len(), 1);
        assert_eq!(module.detected()[0].receiver.package, "com.a");
    }

    #[rstest]
    fn test_instances_do_not_share_state() {
        let iocs = Indicators::from_app_ids("test", ["com.a"]);
        let mut first = DumpsysReceivers::with_results(table(&[(
            "android.intent.action.PHONE_STATE",
            &["com.a/.A"],
        )]));
        first.check_indicators(&iocs).expect("check");

        let second = DumpsysReceivers::new();
        assert_eq!(first.detected().len(), 1);
        assert!(second.detected().is_empty());
        assert!(second.results().is_empty());
    }

    #[rstest]
    fn test_check_helper() {
        let iocs = Indicators::from_app_ids("test", ["com.b"]);
        let results = table(&[
            (INTENT_PHONE_STATE, &["com.a/.A"]),
            (INTENT_NEW_OUTGOING_SMS, &["com.b/.B"]),
        ]);

        let detected = DumpsysReceivers::check(results.clone(), &iocs).expect("check");
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].intent, INTENT_NEW_OUTGOING_SMS);
        assert_eq!(detected[0].receiver.receiver, "com.b/.B");

        let mut module = DumpsysReceivers::with_results(results);
        module.check_indicators(&iocs).expect("check");
        let sms_findings: Vec<&Finding> = module
            .findings()
            .iter()
            .filter(|it| it.intent == SensitiveIntent::NewOutgoingSms)
            .collect();
        assert_eq!(sms_findings.len(), 1);
        assert_eq!(sms_findings[0].receiver, "com.b/.B");
    }

    #[rstest]
    fn test_run_with_adb(mut mock_adb: MockAdb) {
        mock_adb
            .expect_get_connected_devices()
            .returning(|| Ok(vec![String::from("emulator-5554")]));
        mock_adb
            .expect_shell()
            .with(eq("dumpsys package"))
            .times(1)
            .returning(|_| {
                Ok(cmd_output(
                    0,
                    "Receiver Resolver Table:\n  Non-Data Actions:\n      android.intent.action.PHONE_STATE:\n        a com.a/.A filter 1\n\n",
                ))
            });

        let mut module = DumpsysReceivers::new();
        module.run(&mock_adb).expect("run");
        assert_eq!(module.results().len(), 1);
        assert_eq!(
            module.results()["android.intent.action.PHONE_STATE"][0].package,
            "com.a"
        );
    }

    #[rstest]
    fn test_run_without_device(mut mock_adb: MockAdb) {
        mock_adb
            .expect_get_connected_devices()
            .returning(|| Err(crate::Error::NoAdbDevice));
        mock_adb.expect_shell().never();

        let mut module = DumpsysReceivers::new();
        assert!(matches!(
            module.run(&mock_adb),
            Err(crate::Error::NoAdbDevice)
        ));
    }

    #[rstest]
    fn test_run_dumpsys_failure(mut mock_adb: MockAdb) {
        mock_adb
            .expect_get_connected_devices()
            .returning(|| Ok(vec![String::from("emulator-5554")]));
        mock_adb
            .expect_shell()
            .returning(|_| Ok(cmd_output(1, "")));

        let mut module = DumpsysReceivers::new();
        assert!(matches!(
            module.run(&mock_adb),
            Err(crate::Error::CommandError(1, _))
        ));
    }

    #[rstest]
    fn test_run_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dumpsys.txt");
        std::fs::write(
            &path,
            "Receiver Resolver Table:\n  Non-Data Actions:\n      android.intent.action.DATA_SMS_RECEIVED:\n        a com.d/.D filter 1\n",
        )
        .expect("write dump");

        let mut module = DumpsysReceivers::new();
        module.run_from_file(&path).expect("run_from_file");
        assert_eq!(
            module.results()["android.intent.action.DATA_SMS_RECEIVED"][0].receiver,
            "com.d/.D"
        );
    }
}
