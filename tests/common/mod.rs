#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use passwd_srv::Dispatcher;
use passwd_srv::auth::Authorizer;
use passwd_srv::crypt::{MethodResolver, PasswordHasher, SaltGenerator};
use passwd_srv::error::ProvisionError;
use passwd_srv::provision::Provisioner;
use passwd_srv::shadow::{CredentialRecord, ShadowStore};
use tempfile::TempDir;

/// Scratch copies of the host databases.
pub struct TestHost {
    pub dir: TempDir,
    pub shadow: PathBuf,
    pub passwd: PathBuf,
    pub login_defs: PathBuf,
    pub caller: PathBuf,
}

impl TestHost {
    /// `caller_name` is the account that owns the caller path.
    pub fn new(shadow: &str, caller_name: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let shadow_path = dir.path().join("shadow");
        let passwd = dir.path().join("passwd");
        let login_defs = dir.path().join("login.defs");
        let caller = dir.path().join("caller.sock");

        fs::write(&shadow_path, shadow).unwrap();
        fs::write(&login_defs, "ENCRYPT_METHOD SHA512\n").unwrap();
        fs::write(&caller, b"").unwrap();

        let uid = fs::metadata(&caller).unwrap().uid();
        fs::write(
            &passwd,
            format!("{name}:x:{uid}:{uid}::/home/{name}:/bin/sh\n", name = caller_name, uid = uid),
        )
        .unwrap();

        Self {
            dir,
            shadow: shadow_path,
            passwd,
            login_defs,
            caller,
        }
    }

    pub fn store(&self) -> ShadowStore {
        ShadowStore::new(
            &self.shadow,
            self.dir.path().join("shadow.lock"),
            Duration::from_millis(500),
        )
    }

    pub fn dispatcher(&self, provisioner: FakeProvisioner) -> Dispatcher {
        Dispatcher::new(
            self.store(),
            PasswordHasher::new(
                MethodResolver::new(&self.login_defs),
                SaltGenerator::with_seed(1234),
            ),
            Authorizer::new(&self.passwd, "ops"),
            Box::new(provisioner),
        )
    }

    pub fn shadow_contents(&self) -> String {
        fs::read_to_string(&self.shadow).unwrap()
    }
}

/// Stands in for useradd/userdel by editing the scratch shadow file.
#[derive(Clone)]
pub struct FakeProvisioner {
    pub calls: Arc<Mutex<Vec<String>>>,
    shadow: PathBuf,
    /// Whether provisioning writes a shadow record
    pub write_record: bool,
    pub fail_add: bool,
    /// Whether deprovisioning leaves the record behind
    pub keep_on_delete: bool,
}

impl FakeProvisioner {
    pub fn new(host: &TestHost) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            shadow: host.shadow.clone(),
            write_record: true,
            fail_add: false,
            keep_on_delete: false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Provisioner for FakeProvisioner {
    fn provision(&self, username: &str) -> Result<CredentialRecord, ProvisionError> {
        self.calls.lock().unwrap().push(format!("provision {}", username));
        if self.fail_add {
            return Err(ProvisionError::CommandFailed {
                program: "useradd".into(),
                status: Some(9),
            });
        }

        let line = format!("{}:!:19000:0:99999:7:::", username);
        if self.write_record {
            let mut contents = fs::read_to_string(&self.shadow).unwrap();
            contents.push_str(&line);
            contents.push('\n');
            fs::write(&self.shadow, contents).unwrap();
        }
        Ok(CredentialRecord::parse(&line).unwrap())
    }

    fn deprovision(&self, username: &str) -> Result<(), ProvisionError> {
        self.calls.lock().unwrap().push(format!("deprovision {}", username));
        if !self.keep_on_delete {
            let prefix = format!("{}:", username);
            let contents: String = fs::read_to_string(&self.shadow)
                .unwrap()
                .lines()
                .filter(|line| !line.starts_with(&prefix))
                .map(|line| format!("{}\n", line))
                .collect();
            fs::write(&self.shadow, contents).unwrap();
        }
        Ok(())
    }
}

/// A shadow file whose alice entry has password "oldpw".
pub fn shadow_with_alice() -> String {
    let hash = pwhash::md5_crypt::hash_with("$1$oldsalt", "oldpw").unwrap();
    format!(
        "root:*:19000:0:99999:7:::\nalice:{}:19001:0:99999:7:::\nalicia:!:19002:0:99999:7:::\n",
        hash
    )
}
