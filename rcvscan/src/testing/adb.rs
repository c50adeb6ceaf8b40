use std::io;

use mockall::mock;
use rstest::fixture;

use crate::command::CmdOutput;

mock! {
    pub Adb {

    }

    impl crate::adb::Adb for Adb {
        fn get_connected_devices(&self) -> crate::Result<Vec<String>>;
        fn shell(&self, shell_cmd: &str) -> io::Result<CmdOutput>;
    }
}

#[fixture]
pub fn mock_adb() -> MockAdb {
    MockAdb::new()
}

/// Fake command output with the given exit code and stdout
#[cfg(unix)]
pub fn cmd_output(code: i32, stdout: &str) -> CmdOutput {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    CmdOutput {
        status: ExitStatus::from_raw(code << 8),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}
