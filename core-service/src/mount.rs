//! Account mount table.
//!
//! Every account is mounted at the path spelled by its name, so `home`
//! lives at `/home` and `media/movies` at `/media/movies`. A request path
//! belongs to the account with the longest matching mount point; paths
//! above every mount list the next mount segment as virtual folders.
//!
//! The table does not special-case a lone account: it still lives under
//! its name, and `/` lists it as the only mount. An account named `/`
//! serves its files at the top level instead.

use bridge_traits::Account;
use core_drive::{path, File};
use std::collections::HashSet;

/// Driver tag of virtual folders above the mounts.
pub const VIRTUAL_DRIVER: &str = "root";

#[derive(Debug, Clone, PartialEq)]
pub enum Mount {
    /// `path` is relative to the account's root
    Account { name: String, path: String },
    /// Mount segments directly below the requested path
    Virtual(Vec<File>),
}

pub fn mount_point(name: &str) -> String {
    path::normalize(name)
}

fn depth(mount: &str) -> usize {
    if mount == "/" {
        0
    } else {
        mount.matches('/').count()
    }
}

/// Maps `path` onto the mount table; `None` when nothing lives there.
///
/// `accounts` is expected in display order (index, then name); ties between
/// equally long mount points go to the smaller name.
pub fn resolve(accounts: &[Account], path: &str) -> Option<Mount> {
    let path = path::normalize(path);

    let mut best: Option<(&Account, String)> = None;
    for account in accounts {
        let mount = mount_point(&account.name);
        if !path::is_within(&path, &mount) {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_mount)) => {
                let (d, cd) = (depth(&mount), depth(current_mount));
                d > cd || (d == cd && account.name < current.name)
            }
        };
        if better {
            best = Some((account, mount));
        }
    }

    if let Some((account, mount)) = best {
        let inner = if mount == "/" {
            path
        } else {
            path::normalize(&path[mount.len()..])
        };
        return Some(Mount::Account {
            name: account.name.clone(),
            path: inner,
        });
    }

    let children = virtual_children(accounts, &path);
    if children.is_empty() {
        None
    } else {
        Some(Mount::Virtual(children))
    }
}

/// First mount segment below `prefix` of every deeper account, deduplicated
/// and in account order.
pub fn virtual_children(accounts: &[Account], prefix: &str) -> Vec<File> {
    let prefix = path::normalize(prefix);
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for account in accounts {
        let mount = mount_point(&account.name);
        if mount.len() <= prefix.len() || !path::is_within(&mount, &prefix) {
            continue;
        }
        let rest = mount[prefix.len()..].trim_start_matches('/');
        let name = rest.split('/').next().unwrap_or_default();
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }
        let mut folder = File::folder(name, account.provider.clone());
        folder.updated_at = account.updated_at;
        files.push(folder);
    }
    files
}
