use crate::domain::{CommitRecord, Version};
use crate::error::{ReleaseError, Result};
use git2::{
    BranchType, Cred, CredentialType, IndexAddOption, Oid, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, RepositoryOpenFlags, Sort, StatusOptions,
};
use std::collections::HashMap;
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::discover(path.as_ref(), &[])
    }

    /// Search upwards from `path`, never looking above any of `ceilings`
    fn discover(path: &Path, ceilings: &[&Path]) -> Result<Self> {
        let repo = Git2Repo::open_ext(path, RepositoryOpenFlags::empty(), ceilings)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    /// Map of commit id to the tag names pointing at it.
    ///
    /// Handles both lightweight and annotated tags.
    fn tags_by_commit(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut tags: HashMap<Oid, Vec<String>> = HashMap::new();

        for name in self.repo.tag_names(None)?.iter().flatten() {
            let reference = match self.repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(reference) => reference,
                Err(_) => continue,
            };
            if let Ok(commit) = reference.peel_to_commit() {
                tags.entry(commit.id()).or_default().push(name.to_string());
            }
        }

        Ok(tags)
    }
}

/// Pick the tag to report when several point at one commit: the highest
/// release tag if any parse, otherwise the alphabetically last.
fn preferred_tag(mut names: Vec<String>) -> Option<String> {
    names.sort();
    let best_release = names
        .iter()
        .filter_map(|name| Version::parse_tag(name).ok().map(|v| (v, name)))
        .max_by_key(|(v, _)| *v)
        .map(|(_, name)| name.clone());
    best_release.or_else(|| names.pop())
}

fn credentials_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }

            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }
        }

        Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<Option<String>> {
        if self.repo.head_detached()? {
            return Ok(None);
        }

        let head = self.repo.head()?;
        head.shorthand()
            .map(|name| Some(name.to_string()))
            .ok_or_else(|| ReleaseError::config("Branch name is not valid UTF-8"))
    }

    fn uncommitted_changes(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;

        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect())
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        let mut tags = self.tags_by_commit()?;
        if tags.is_empty() {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;

        for oid in revwalk {
            let oid = oid?;
            if let Some(names) = tags.remove(&oid) {
                return Ok(preferred_tag(names));
            }
        }

        Ok(None)
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitRecord>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push_head()?;

        if let Some(tag) = tag {
            let tagged = self
                .repo
                .find_reference(&format!("refs/tags/{}", tag))
                .and_then(|r| r.peel_to_commit())?;
            revwalk.hide(tagged.id())?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let subject = commit.summary().unwrap_or("(empty message)").to_string();
            let author = commit.author().name().unwrap_or("unknown").to_string();

            commits.push(CommitRecord::new(subject, author).with_id(commit.id().to_string()));
        }

        Ok(commits)
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn head_hash(&self) -> Result<String> {
        Ok(self.head_commit()?.id().to_string())
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;

        Ok(oid.to_string())
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        let head = self.head_commit()?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, head.as_object(), &signature, message, false)?;

        Ok(())
    }

    fn push(&self, remote: &str, branch: &str, tag: &str) -> Result<()> {
        // the branch must exist locally, otherwise the refspec is meaningless
        self.repo.find_branch(branch, BranchType::Local)?;

        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut callbacks = credentials_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspecs = [
            format!("refs/heads/{0}:refs/heads/{0}", branch),
            format!("refs/tags/{0}:refs/tags/{0}", tag),
        ];

        remote.push(&refspecs, Some(&mut options)).map_err(|e| {
            if e.class() == git2::ErrorClass::Net {
                ReleaseError::remote(format!("Network error during push: {}", e))
            } else {
                ReleaseError::remote(format!("Push failed: {}", e))
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_tag_picks_highest_release() {
        let names = vec![
            "v1.2.0".to_string(),
            "v1.10.0".to_string(),
            "nightly".to_string(),
        ];
        assert_eq!(preferred_tag(names), Some("v1.10.0".to_string()));
    }

    #[test]
    fn test_preferred_tag_without_release_tags() {
        let names = vec!["beta".to_string(), "alpha".to_string()];
        assert_eq!(preferred_tag(names), Some("beta".to_string()));
        assert_eq!(preferred_tag(Vec::new()), None);
    }

    use crate::git::Repository;
    use git2::{RepositoryInitOptions, Signature};
    use tempfile::TempDir;

    fn init_on_main(dir: &Path) -> Git2Repo {
        let mut options = RepositoryInitOptions::new();
        options.initial_head("main");
        let repo = Git2Repo::init_opts(dir, &options).unwrap();
        {
            let signature = Signature::now("Test User", "test@example.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn test_open_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let err = Git2Repository::discover(dir.path(), &[dir.path()])
            .err()
            .expect("plain directory should not open as a repository");
        assert!(matches!(err, ReleaseError::Git(_)));
    }

    #[test]
    fn test_open_discovers_repository_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        init_on_main(dir.path());
        let nested = dir.path().join("src").join("models");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = Git2Repository::discover(&nested, &[dir.path()]).unwrap();
        assert_eq!(
            repo.workdir().unwrap().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_current_branch_on_branch_and_detached() {
        let dir = TempDir::new().unwrap();
        let raw = init_on_main(dir.path());
        let head = raw.head().unwrap().target().unwrap();
        let repo = Git2Repository::from_git2(raw);
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));

        repo.repo.set_head_detached(head).unwrap();
        assert_eq!(repo.current_branch().unwrap(), None);
    }
}
