//! Shared fixtures for the store contract suite.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use trustctl_core::{extract, CertRecord};
use trustctl_store::platform::PemDirStore;
use trustctl_store::{CommandOutput, CommandRunner};

pub const STARFIELD: &[u8] = include_bytes!("../../../../testdata/starfield.pem");
pub const GLOBALSIGN: &[u8] = include_bytes!("../../../../testdata/globalsign.pem");
pub const DIGICERT: &[u8] = include_bytes!("../../../../testdata/digicert.pem");
pub const ISRG: &[u8] = include_bytes!("../../../../testdata/isrg.pem");
pub const ROGUE: &[u8] = include_bytes!("../../../../testdata/rogue.pem");
pub const SHADY: &[u8] = include_bytes!("../../../../testdata/shady.pem");

pub const ALL: &[&[u8]] = &[STARFIELD, GLOBALSIGN, DIGICERT, ISRG, ROGUE, SHADY];

pub const STARFIELD_SHA256: &str = "b2b11f74d42446e0b07f9a7197a63eaf0857f7933a2426a7a6cfdd701d7a63c2";
pub const GLOBALSIGN_SHA256: &str = "9bcd3181278eeb0686c5a1e36d3d5834a95e9074cf281b4a8b40f1ef4d3f7ada";
pub const ROGUE_SHA256: &str = "feb70d51179af1cb4e2597d8502e77578e7a14563a1e148dcaf43baf7db6bbb1";

pub fn parse(pem: &[u8]) -> CertRecord {
    extract::parse_pem(pem, "fixture").unwrap().remove(0)
}

/// PEM directory seeded with one file per certificate.
pub fn pem_dir(root: &Path, certs: &[&[u8]]) -> PemDirStore {
    let dir = root.join("certs");
    fs::create_dir_all(&dir).unwrap();
    for (i, pem) in certs.iter().enumerate() {
        fs::write(dir.join(format!("ca-{i}.pem")), pem).unwrap();
    }
    PemDirStore::new(dir)
}

/// Stands in for `powershell` and `certutil` over an in-memory root store.
#[derive(Default)]
pub struct FakeWindows {
    /// SHA-1 thumbprint to DER
    certs: RefCell<BTreeMap<String, Vec<u8>>>,
    /// Thumbprints `certutil -addstore` refuses
    refuse: RefCell<HashSet<String>>,
    calls: RefCell<Vec<String>>,
}

impl FakeWindows {
    pub fn with(certs: &[&[u8]]) -> Self {
        let fake = Self::default();
        for pem in certs {
            fake.insert(pem);
        }
        fake
    }

    fn insert(&self, pem: &[u8]) -> String {
        let cert = extract::parse_pem(pem, "fake").unwrap().remove(0);
        self.certs.borrow_mut().insert(cert.sha1.clone(), cert.der);
        cert.sha1
    }

    /// Make `certutil -addstore` fail for this certificate.
    pub fn refuse(&self, pem: &[u8]) {
        let cert = extract::parse_pem(pem, "fake").unwrap().remove(0);
        self.refuse.borrow_mut().insert(cert.sha1);
    }

    pub fn len(&self) -> usize {
        self.certs.borrow().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn listing(&self) -> String {
        self.certs
            .borrow()
            .values()
            .map(|der| format!("{}\r\n", STANDARD.encode(der)))
            .collect()
    }

    fn delete(&self, thumbprint: &str) -> CommandOutput {
        match self.certs.borrow_mut().remove(thumbprint) {
            Some(_) => CommandOutput::ok("CertUtil: -delstore command completed successfully."),
            None => CommandOutput::failed(1, "CertUtil: Cannot find object or property."),
        }
    }

    fn add(&self, file: &str) -> CommandOutput {
        let pem = fs::read(PathBuf::from(file)).unwrap();
        let cert = extract::parse_pem(&pem, file).unwrap().remove(0);
        if self.refuse.borrow().contains(&cert.sha1) {
            return CommandOutput::failed(5, "CertUtil: Access is denied.");
        }
        self.insert(&pem);
        CommandOutput::ok("CertUtil: -addstore command completed successfully.")
    }
}

impl CommandRunner for FakeWindows {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        self.calls
            .borrow_mut()
            .push(format!("{program} {}", args.join(" ")));
        Ok(match (program, args) {
            ("powershell", _) => CommandOutput::ok(self.listing()),
            ("certutil", ["-delstore", "Root", thumbprint]) => self.delete(thumbprint),
            ("certutil", ["-addstore", "-f", "Root", file]) => self.add(file),
            _ => CommandOutput::failed(1, format!("unexpected call: {program} {args:?}")),
        })
    }
}

/// Stands in for `security` over in-memory keychains.
#[derive(Default)]
pub struct FakeKeychain {
    /// Keychain path to uppercase SHA-1 to PEM
    keychains: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
    /// SHA-1 thumbprints `add-trusted-cert` refuses
    refuse: RefCell<HashSet<String>>,
}

impl FakeKeychain {
    pub fn with(seed: &[(&str, &[&[u8]])]) -> Self {
        let fake = Self::default();
        for (keychain, certs) in seed {
            for pem in *certs {
                fake.insert(keychain, &parse(pem).to_pem());
            }
        }
        fake
    }

    fn insert(&self, keychain: &str, pem: &str) {
        let cert = extract::parse_pem(pem.as_bytes(), keychain).unwrap().remove(0);
        self.keychains
            .borrow_mut()
            .entry(keychain.to_string())
            .or_default()
            .insert(cert.sha1.to_ascii_uppercase(), pem.to_string());
    }

    pub fn refuse(&self, pem: &[u8]) {
        self.refuse.borrow_mut().insert(parse(pem).sha1.to_ascii_uppercase());
    }

    /// Whether `keychain` holds the certificate.
    pub fn holds(&self, keychain: &str, pem: &[u8]) -> bool {
        let sha1 = parse(pem).sha1.to_ascii_uppercase();
        self.keychains
            .borrow()
            .get(keychain)
            .is_some_and(|certs| certs.contains_key(&sha1))
    }

    fn find(&self, keychain: &str) -> CommandOutput {
        let pems: String = self
            .keychains
            .borrow()
            .get(keychain)
            .map(|certs| certs.values().map(|p| format!("{}\n", p.trim_end())).collect())
            .unwrap_or_default();
        CommandOutput::ok(pems)
    }

    fn delete(&self, sha1: &str, keychain: &str) -> CommandOutput {
        let removed = self
            .keychains
            .borrow_mut()
            .get_mut(keychain)
            .and_then(|certs| certs.remove(sha1));
        match removed {
            Some(_) => CommandOutput::ok(Vec::new()),
            None => CommandOutput::failed(44, format!("Unable to delete certificate matching \"{sha1}\"")),
        }
    }

    fn add(&self, keychain: &str, file: &str) -> CommandOutput {
        let pem = fs::read_to_string(file).unwrap();
        let cert = extract::parse_pem(pem.as_bytes(), file).unwrap().remove(0);
        if self.refuse.borrow().contains(&cert.sha1.to_ascii_uppercase()) {
            return CommandOutput::failed(1, "SecTrustSettingsSetTrustSettings: The authorization was denied.");
        }
        self.insert(keychain, &pem);
        CommandOutput::ok(Vec::new())
    }
}

impl CommandRunner for FakeKeychain {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        Ok(match (program, args) {
            ("security", ["find-certificate", "-a", "-p", keychain]) => self.find(keychain),
            ("security", ["delete-certificate", "-Z", sha1, keychain]) => self.delete(sha1, keychain),
            ("security", ["add-trusted-cert", "-d", "-r", "trustRoot", "-k", keychain, file]) => {
                self.add(keychain, file)
            }
            _ => CommandOutput::failed(1, format!("unexpected call: {program} {args:?}")),
        })
    }
}

const NSS_NOT_FOUND: &str = "certutil: Could not find cert: \n: PR_FILE_NOT_FOUND_ERROR: File not found";

/// Stands in for NSS `certutil`, keeping `(nickname, pem)` rows as JSON in
/// `cert9.db` so copying the database files backs it up.
#[derive(Default)]
pub struct FakeCertutil {
    deletes: RefCell<Vec<String>>,
}

impl FakeCertutil {
    /// Database in `dir` holding each certificate under its subject name.
    pub fn seed(dir: &Path, certs: &[&[u8]]) {
        let rows: Vec<(String, String)> = certs
            .iter()
            .map(|pem| {
                let cert = parse(pem);
                (cert.display_name().to_string(), cert.to_pem())
            })
            .collect();
        Self::write_rows(dir, &rows);
    }

    /// Database in `dir` holding exactly these rows.
    pub fn seed_rows(dir: &Path, rows: &[(&str, &[u8])]) {
        let rows: Vec<(String, String)> = rows
            .iter()
            .map(|(nick, pem)| ((*nick).to_string(), parse(pem).to_pem()))
            .collect();
        Self::write_rows(dir, &rows);
    }

    pub fn rows(dir: &Path) -> Vec<(String, String)> {
        serde_json::from_slice(&fs::read(dir.join("cert9.db")).unwrap()).unwrap()
    }

    /// Nicknames passed to `-D`, in order.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.borrow().clone()
    }

    fn write_rows(dir: &Path, rows: &[(String, String)]) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("cert9.db"), serde_json::to_vec(rows).unwrap()).unwrap();
    }
}

fn flag<'a>(args: &[&'a str], name: &str) -> Option<&'a str> {
    args.iter().position(|a| *a == name).map(|i| args[i + 1])
}

impl CommandRunner for FakeCertutil {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        assert_eq!(program, "certutil");
        let dir = PathBuf::from(flag(args, "-d").unwrap().trim_start_matches("sql:"));
        let mut rows = Self::rows(&dir);
        let output = match (args[0], flag(args, "-n")) {
            ("-L", None) => {
                let mut out = String::from("\nCertificate Nickname                                         Trust Attributes\n");
                out.push_str(&format!("{:61}SSL,S/MIME,JAR/XPI\n\n", ""));
                for (nick, _) in &rows {
                    out.push_str(&format!("{nick:<60} C,,\n"));
                }
                CommandOutput::ok(out)
            }
            ("-L", Some(nick)) => {
                let pem: String = rows
                    .iter()
                    .filter(|(n, _)| n == nick)
                    .map(|(_, p)| format!("{}\n", p.trim_end()))
                    .collect();
                if pem.is_empty() {
                    CommandOutput::failed(255, NSS_NOT_FOUND)
                } else {
                    CommandOutput::ok(pem)
                }
            }
            ("-D", Some(nick)) => match rows.iter().position(|(n, _)| n == nick) {
                Some(i) => {
                    rows.remove(i);
                    Self::write_rows(&dir, &rows);
                    self.deletes.borrow_mut().push(nick.to_string());
                    CommandOutput::ok(Vec::new())
                }
                None => CommandOutput::failed(255, NSS_NOT_FOUND),
            },
            _ => CommandOutput::failed(1, format!("unexpected call: {program} {args:?}")),
        };
        Ok(output)
    }
}

/// Stands in for `keytool`, keeping `(alias, pem)` entries as JSON in the
/// keystore file itself.
pub struct FakeKeytool;

impl FakeKeytool {
    /// Keystore at `path` holding each certificate under a keytool-style alias.
    pub fn seed(path: &Path, certs: &[&[u8]]) {
        let entries: Vec<(String, String)> = certs
            .iter()
            .map(|pem| {
                let cert = parse(pem);
                (cert.display_name().to_lowercase().replace(' ', ""), cert.to_pem())
            })
            .collect();
        fs::write(path, serde_json::to_vec(&entries).unwrap()).unwrap();
    }

    fn listing(entries: &[(String, String)]) -> String {
        let mut out = format!(
            "Keystore type: PKCS12\nKeystore provider: SUN\n\nYour keystore contains {} entries\n\n",
            entries.len()
        );
        for (alias, pem) in entries {
            out.push_str(&format!(
                "Alias name: {alias}\nCreation date: Jan 1, 2024\nEntry type: trustedCertEntry\n\n\
                 {pem}\n\n*******************************************\n\n\n"
            ));
        }
        out
    }
}

impl CommandRunner for FakeKeytool {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        assert!(program.ends_with("keytool"), "{program}");
        if flag(args, "-storepass") != Some("changeit") {
            return Ok(CommandOutput::failed(
                1,
                "keytool error: java.io.IOException: keystore password was incorrect",
            ));
        }
        let keystore = PathBuf::from(flag(args, "-keystore").unwrap());
        let mut entries: Vec<(String, String)> =
            serde_json::from_slice(&fs::read(&keystore).unwrap()).unwrap();

        Ok(match (args[0], flag(args, "-alias")) {
            ("-list", _) => CommandOutput::ok(Self::listing(&entries)),
            ("-delete", Some(alias)) => match entries.iter().position(|(a, _)| a == alias) {
                Some(i) => {
                    entries.remove(i);
                    fs::write(&keystore, serde_json::to_vec(&entries).unwrap()).unwrap();
                    CommandOutput::ok(Vec::new())
                }
                None => CommandOutput::failed(
                    1,
                    format!("keytool error: java.lang.Exception: Alias <{alias}> does not exist"),
                ),
            },
            _ => CommandOutput::failed(1, format!("unexpected call: {program} {args:?}")),
        })
    }
}
