// src/templates/tilt.rs

pub(super) const TILTFILE: &str = r#"# Generated by aldev, do not edit!
# not sending data
analytics_settings(enable=False)

# --- Preparation -------------------------------------------------------------

# custom config
config.define_bool('use-local', usage='use this to include our own libraries in dev mode')
config.define_bool('api-only', usage='use this to only work with the API part of this project')
cfg = config.parse()
useLocalDeps = cfg.get('use-local')
apiOnly = cfg.get('api-only')

# describing the deployment of all the backend services, and their configuration
if useLocalDeps or apiOnly:
  # with local dependencies, or in API-only mode, the web app is not containerised
  k8s_yaml(kustomize('{{deploying.dir}}/overlays/local'))
else:
  k8s_yaml(kustomize('{{deploying.dir}}/overlays/dev'))

# --- API part ----------------------------------------------------------------

# building the API's code
local_resource(
    name  ='{{appname}}-api-compile',
    cmd   ='aldev codegen --compilation-only',
    deps  =['{{api.srcdir}}'],
    # the API config is ignored here, because aldev is already watching it
    ignore=['{{api.srcdir}}/go.sum', '{{api.srcdir}}/_include', '{{api.srcdir}}/**/*/classutils', '{{api.srcdir}}/{{api.config}}'],
    )

# describing the containers for the backend - cf https://docs.tilt.dev/extensions.html
load('ext://restart_process', 'docker_build_with_restart')
docker_build_with_restart(
  ref        ='{{appname}}-api-image',
  context    ='.',
  entrypoint =['/api/{{appname}}-api-local'],
  dockerfile ='{{deploying.dir}}/docker/{{appname}}-local-api-docker',
  only       =['./{{bindir}}', './{{api.datadir}}'],
  live_update=[
    sync('./{{bindir}}', '/api'),
    sync('./{{api.datadir}}', '/api/data'),
  ],
)

# deploying the API
k8s_resource('{{appname}}-api-depl', resource_deps=['{{appname}}-api-compile'])

# getting the load balancer's IP
apiHost = str(local(echo_off=True, command="kubectl get services --namespace kube-system "+
  "-o jsonpath='{.items[?(@.spec.type==\"LoadBalancer\")].status.loadBalancer.ingress[0].ip}'"))

# the load balancer is on host 'apiHost', not 'localhost': proxying localhost:apiPort to it
local_resource(
    name         ='{{appname}}-lb-proxy',
    cmd          ='killall -q socat || true',
    serve_cmd    ='socat TCP-LISTEN:{{api.port}},fork TCP:'+apiHost+':{{api.port}}',
    resource_deps=['{{appname}}-api-depl'],
    )
{{#if web}}

# --- WEB part ----------------------------------------------------------------

if not apiOnly:
  if useLocalDeps:
    # the env vars defined in the aldev config file
    webAppEnvVars = "WEB_API_URL=http://localhost:{{api.port}}"
{{#each web.envvars}}
    webAppEnvVars += " {{name}}={{value}}"
{{/each}}
    # locally running Vite's dev server
    local_resource(
        name         ='{{appname}}-vite-serve',
        dir          ='{{web.srcdir}}',
        cmd          ='rm -fr node_modules/.vite && npm i --force',
        deps         =['{{web.srcdir}}/package.json'],
        serve_cmd    =webAppEnvVars + ' npm run dev',
        serve_dir    ='{{web.srcdir}}',
        resource_deps=['{{appname}}-lb-proxy'],
        )
  else:
    docker_build(
      '{{appname}}-web-image',
      context='.',
      dockerfile='./{{deploying.dir}}/docker/{{appname}}-local-web-docker',
      only=['{{web.srcdir}}/'],
      ignore=['{{web.srcdir}}/dist/'],
      live_update=[
          fall_back_on('{{web.srcdir}}/vite.config.js'),
          sync('{{web.srcdir}}/', '/web/'),
          run(
              'npm install --force',
              trigger=['{{web.srcdir}}/package.json', '{{web.srcdir}}/package-lock.json']
          )
      ]
    )

    k8s_resource(
        '{{appname}}-web-depl',
        port_forwards='{{web.port}}:5173', # Vite listens on 5173 in the container
        resource_deps=['{{appname}}-api-depl'],
    )
else:
  print("\nAPI only mode")
{{else}}

print("\nAPI only mode")
{{/if}}
"#;
