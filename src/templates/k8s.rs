// src/templates/k8s.rs

pub(super) const NAMESPACE: &str = r#"apiVersion: v1
kind: Namespace
metadata:
  name: {{appname}}-{{overlay}}
"#;

pub(super) const KUSTOMIZATION_BASE: &str = r#"apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization

resources:
  - {{appname}}-api-.yaml
  - {{appname}}-api-lb.yaml
  - {{appname}}-cm.yaml
{{#if web}}
  - {{appname}}-web.yaml
{{/if}}
"#;

pub(super) const KUSTOMIZATION_OVERLAY: &str = r#"apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
namespace: {{appname}}-{{overlay}}
resources:
  - ../../base
  - namespace-{{overlay}}.yaml
{{#if patches}}
patches:
{{#each patches}}
  - path: {{this}}
{{/each}}
{{/if}}
"#;

pub(super) const NO_WEB_CONTAINER_PATCH: &str = r#"$patch: delete
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{appname}}-web-depl
"#;

pub(super) const API_DEPLOYMENT: &str = r#"# each backend pod
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{appname}}-api-depl

spec:
  replicas: 3
  selector:
    matchLabels:
      app: {{appname}}-api
  template:
    metadata:
      labels:
        app: {{appname}}-api
    spec:
      containers:
        - name: {{appname}}-api
          image: {{appname}}-api-image
          args:
            - "-config=config/config.yaml"
          volumeMounts:
          - name: config-volume
            mountPath: /api/config
      volumes:
      - name: config-volume
        configMap:
          name: {{appname}}-configmap
"#;

pub(super) const API_LB: &str = r#"# the load balancer routing to the backend pods
apiVersion: v1
kind: Service
metadata:
  name: {{appname}}-api-lb

spec:
  selector:
    app: {{appname}}-api
  ports:
    - name: http
      port: {{api.port}} # load balancer port (external) - set by aldev
      targetPort: 55555 # API port (internal) - should not be changed
  type: LoadBalancer
"#;

pub(super) const WEB_DEPLOYMENT: &str = r#"# the frontend pod
apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{appname}}-web-depl
  labels:
    app: {{appname}}-web

spec:
  replicas: 1
  selector:
    matchLabels:
      app: {{appname}}-web
  template:
    metadata:
      labels:
        app: {{appname}}-web
    spec:
      containers:
        - name: {{appname}}-web
          image: {{appname}}-web-image
          env:
            - name: VITE_CLIENT_PORT
              value: '{{web.port}}'
          ports:
            - containerPort: 3000
"#;
