// src/templates/repo.rs

pub(super) const WEB_ENV_LIST: &str = r#"WEB_API_URL=URL for the API; automatically set in the local dev environment in the Tiltfile
{{#each web.envvars}}
{{name}}={{desc}}
{{/each}}
"#;

pub(super) const GITIGNORE: &str = r#"# no hidden file
.*

# except these
!.dockerignore
!.gitignore
!.aldev.yaml
!.gitkeep
!.prettierrc
!.eslintrc.cjs
!.gitlab-ci.yml

# no temp file
bin/
tmp/
node_modules/
"#;

pub(super) const GITHOOK_PRECOMMIT: &str = r#"#!/bin/bash
# Generated by aldev, do not edit!

arr=({{hotswap_tag}})

for i in "${arr[@]}"
do
    git diff --cached --name-only | xargs grep --with-filename -n $i && echo "COMMIT REJECTED! Found '$i' references. Please remove them before committing." && exit 1
done

exit 0
"#;

pub(super) const GITHOOK_COMMITMSG: &str = r#"#!/bin/bash
# Generated by aldev, do not edit!

COMMIT_MSG_FILE=$1
COMMIT_MSG=$(head -n 1 "$COMMIT_MSG_FILE")
PREFIXES=("dev:" "feat:" "fix:")
IS_VALID=false

for PREFIX in "${PREFIXES[@]}"; do
    if [[ "$COMMIT_MSG" == "$PREFIX"* ]]; then
        IS_VALID=true
        break
    fi
done

if [ "$IS_VALID" = false ]; then
    echo "Error: Commit message must start with one of the following prefixes: ${PREFIXES[*]}"
    exit 1
fi
"#;
