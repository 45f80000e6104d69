use context_preset::{
    compile, expand, Compiler, CompilerConfig, ExtensionGrouping, MemoryFileSystem,
    OptimizationLevel, PresetStore,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const PROJECT: &[&str] = &[
    "src/components/Button/index.ts",
    "src/components/Button/Button.tsx",
    "src/components/Button/Button.css",
    "src/components/Button/README.md",
    "src/components/Input/index.ts",
    "src/components/Input/Input.tsx",
    "src/api/client.ts",
    "src/api/routes.ts",
    "src/api/types.ts",
    "src/api/util.ts",
    "src/api/README.md",
    "src/lib/math.ts",
    "src/lib/strings.ts",
    "src/lib/format.js",
    "src/debug.log",
    "docs/guide.md",
    "docs/intro.md",
    "docs/[draft].md",
    "scripts/release.sh",
    "scripts/setup.sh",
    "README.md",
    "package.json",
    ".env",
    "node_modules/dep/index.js",
    "node_modules/dep/package.json",
    "build/bundle.js",
    "logs/server.log",
];

fn setup_project(files: &[&str]) -> TempDir {
    let temp = tempdir().unwrap();
    for file in files {
        let path = temp.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, file).unwrap();
    }
    temp
}

fn selections() -> Vec<Vec<&'static str>> {
    vec![
        vec![
            "src/components/Button/index.ts",
            "src/components/Button/Button.tsx",
            "src/components/Button/Button.css",
            "src/components/Button/README.md",
        ],
        vec!["src/api/client.ts", "src/api/routes.ts", "src/api/types.ts", "src/api/util.ts"],
        PROJECT
            .iter()
            .copied()
            .filter(|f| f.ends_with(".ts") && !f.starts_with("node_modules"))
            .collect(),
        vec![
            "src/lib/math.ts",
            "src/lib/strings.ts",
            "src/lib/format.js",
            "node_modules/dep/index.js",
            "logs/server.log",
            "src/debug.log",
        ],
        vec!["docs/[draft].md"],
        vec!["docs/guide.md", "docs/intro.md", "docs/[draft].md"],
        vec![".env", "package.json", "README.md"],
        vec![
            "src/components/Button/index.ts",
            "src/components/Button/Button.tsx",
            "src/components/Input/index.ts",
            "src/components/Input/Input.tsx",
        ],
        vec![
            "src/components/Button/index.ts",
            "src/components/Button/Button.tsx",
            "src/components/Button/Button.css",
            "src/components/Button/README.md",
            "src/components/Input/index.ts",
            "src/components/Input/Input.tsx",
            "src/api/client.ts",
            "src/api/routes.ts",
            "scripts/release.sh",
        ],
        vec!["src/api/client.ts", "src/api/routes.ts", "src/api/types.ts", "src/api/README.md"],
        PROJECT.to_vec(),
    ]
}

fn sorted(selection: &[&str]) -> Vec<String> {
    let mut files: Vec<String> = selection.iter().map(|s| s.to_string()).collect();
    files.sort();
    files
}

fn round_trip(root: &Path, selection: &[&str], level: OptimizationLevel) -> Vec<String> {
    let result = compile(selection.iter().copied(), root, level).unwrap();
    let text = result.to_pattern_text(Some("round trip"));
    let expanded = expand(&text, root).unwrap();
    assert_eq!(
        expanded,
        sorted(selection),
        "level {level}, patterns {:?}",
        result.patterns
    );
    result.patterns
}

#[test]
fn every_level_reproduces_the_selection() {
    let temp = setup_project(PROJECT);
    for selection in selections() {
        for level in OptimizationLevel::ALL {
            round_trip(temp.path(), &selection, level);
        }
    }
}

#[test]
fn direct_extension_grouping_also_round_trips() {
    let temp = setup_project(PROJECT);
    let compiler = Compiler::new().with_config(CompilerConfig {
        extension_grouping: ExtensionGrouping::Direct,
        ..CompilerConfig::default()
    });
    for selection in selections() {
        for level in OptimizationLevel::ALL {
            let result = compiler.compile(&selection, temp.path(), level).unwrap();
            let expanded = expand(&result.to_pattern_text(None), temp.path()).unwrap();
            assert_eq!(expanded, sorted(&selection), "{:?}", result.patterns);
        }
    }
}

#[test]
fn higher_levels_never_emit_more_patterns() {
    let temp = setup_project(PROJECT);
    for selection in selections() {
        let counts: Vec<usize> = OptimizationLevel::ALL
            .iter()
            .map(|level| round_trip(temp.path(), &selection, *level).len())
            .collect();
        assert!(
            counts[0] >= counts[1] && counts[1] >= counts[2],
            "{selection:?}: {counts:?}"
        );
    }
}

/// Small tree vocabulary so random projects share directories and extensions
fn candidate_files() -> Vec<String> {
    let mut files = Vec::new();
    for dir in ["a", "a/b", "a/b/c", "d"] {
        for name in ["x", "y", "z"] {
            for ext in ["ts", "tsx", "md"] {
                files.push(format!("{dir}/{name}.{ext}"));
            }
        }
    }
    files
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_projects_never_lose_compactness(
        files in proptest::sample::subsequence(candidate_files(), 1..16),
        picks in proptest::collection::vec(any::<bool>(), 16),
    ) {
        let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let selection: Vec<&str> = file_refs
            .iter()
            .zip(&picks)
            .filter(|(_, pick)| **pick)
            .map(|(file, _)| *file)
            .collect();
        let compiler = Compiler::with_fs(MemoryFileSystem::with_files("/p", &file_refs));

        let counts: Vec<usize> = OptimizationLevel::ALL
            .iter()
            .map(|level| compiler.compile(&selection, "/p", *level).unwrap().patterns.len())
            .collect();
        prop_assert!(
            counts[0] >= counts[1] && counts[1] >= counts[2],
            "{:?} of {:?}: {:?}",
            selection,
            file_refs,
            counts
        );
    }
}

#[test]
fn documented_scenarios() {
    let temp = setup_project(PROJECT);
    let root = temp.path();
    let patterns = |selection: &[&str], level| {
        compile(selection.iter().copied(), root, level)
            .unwrap()
            .patterns
    };
    let selections = selections();

    assert_eq!(
        patterns(&selections[0][..], OptimizationLevel::Minimal),
        vec!["src/components/Button/**"]
    );
    assert_eq!(
        patterns(&selections[1][..], OptimizationLevel::Balanced),
        vec!["src/api/*.ts"]
    );
    assert_eq!(
        patterns(&selections[2][..], OptimizationLevel::Aggressive),
        vec!["**/*.ts"]
    );

    let pkg = setup_project(&["pkg/a.ts", "pkg/b.ts", "pkg/c.ts"]);
    assert_eq!(
        compile(["pkg/a.ts", "pkg/b.ts"], pkg.path(), OptimizationLevel::Balanced)
            .unwrap()
            .patterns,
        vec!["pkg/**", "!pkg/c.ts"]
    );

    let components = setup_project(&[
        "src/components/Button.ts",
        "src/components/Button.tsx",
        "src/components/Input.ts",
        "src/components/Input.tsx",
        "src/components/Button.css",
        "src/legacy/Old.tsx",
        "src/index.ts",
    ]);
    let selection = [
        "src/components/Button.ts",
        "src/components/Button.tsx",
        "src/components/Input.ts",
        "src/components/Input.tsx",
    ];
    let result = compile(selection, components.path(), OptimizationLevel::Aggressive).unwrap();
    assert_eq!(result.patterns, vec!["src/components/*.{ts,tsx}"]);
    assert_eq!(
        expand(&result.to_pattern_text(None), components.path()).unwrap(),
        sorted(&selection)
    );
}

#[test]
fn isolated_file_stays_literal_at_every_level() {
    let temp = setup_project(PROJECT);
    for level in OptimizationLevel::ALL {
        for file in ["scripts/setup.sh", "src/api/util.ts", "README.md", "src/debug.log"] {
            assert_eq!(round_trip(temp.path(), &[file], level), vec![file]);
        }
    }
}

#[test]
fn unsafe_input_is_rejected() {
    let temp = setup_project(PROJECT);
    for level in OptimizationLevel::ALL {
        let err = compile(["../x"], temp.path(), level).unwrap_err();
        assert!(err.is_unsafe_input());
    }
    assert!(expand("../x", temp.path()).unwrap_err().is_unsafe_input());
    assert!(expand("src/**\n!/etc/passwd", temp.path())
        .unwrap_err()
        .is_unsafe_input());
}

#[test]
fn stored_presets_expand_to_the_selection() {
    let temp = setup_project(PROJECT);
    let selections = selections();
    let selection = &selections[8];
    let result = compile(selection.iter().copied(), temp.path(), OptimizationLevel::Aggressive)
        .unwrap();

    let store = PresetStore::for_project(temp.path());
    store
        .save("components", &result.to_pattern_text(Some("components and api")))
        .unwrap();
    let text = store.load("components").unwrap();
    assert!(text.starts_with("# components and api\n"));
    assert_eq!(expand(&text, temp.path()).unwrap(), sorted(selection));
}

#[cfg(unix)]
#[test]
fn linked_directories_fall_back_to_literals() {
    let temp = setup_project(&["src/a.ts", "src/b.ts", "lib/c.ts", "lib/d.ts"]);
    let outside = setup_project(&["x.ts", "y.ts"]);
    std::os::unix::fs::symlink(outside.path(), temp.path().join("src/linked")).unwrap();

    let selection = ["src/a.ts", "src/b.ts", "src/linked/x.ts", "lib/c.ts", "lib/d.ts"];
    for level in OptimizationLevel::ALL {
        let patterns = round_trip(temp.path(), &selection, level);
        assert!(patterns.contains(&"lib/**".to_string()), "{patterns:?}");
        assert!(
            patterns.iter().all(|p| !p.starts_with("src/**") && !p.starts_with("**")),
            "{patterns:?}"
        );
    }
}

#[cfg(unix)]
#[test]
fn linked_files_inside_the_project_count_as_files() {
    let temp = setup_project(&["shared/a.ts", "src/b.ts"]);
    std::os::unix::fs::symlink(
        temp.path().join("shared/a.ts"),
        temp.path().join("src/a.ts"),
    )
    .unwrap();

    let patterns = round_trip(
        temp.path(),
        &["src/a.ts", "src/b.ts"],
        OptimizationLevel::Minimal,
    );
    assert_eq!(patterns, vec!["src/**"]);
}
