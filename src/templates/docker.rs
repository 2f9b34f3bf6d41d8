// src/templates/docker.rs

pub(super) const LOCAL_API: &str = r#"FROM alpine:latest
RUN apk update && apk add --no-cache bash
WORKDIR /api
ADD ./{{bindir}} .
ENTRYPOINT ./{{appname}}-api-local
"#;

pub(super) const LOCAL_WEB: &str = r#"FROM node:alpine
WORKDIR /web
COPY {{web.srcdir}}/package*.json {{web.srcdir}}/.npmrc ./
RUN npm install
COPY {{web.srcdir}}/ ./
CMD ["npm", "run", "dev"]
"#;

pub(super) const REMOTE_API: &str = r#"# --- backend building --------------------------------------------------------
FROM golang:alpine AS buildStage

RUN apk update && apk add --no-cache git

# token for the private modules
ARG GITHUB_TOKEN
RUN git config --global --add url."https://${GITHUB_TOKEN}:@github.com/".insteadOf "https://github.com/"

WORKDIR /build
COPY {{api.srcdir}} .
RUN go build -o {{appname}}-api ./main

# --- running -----------------------------------------------------------------
FROM alpine:latest
WORKDIR /api
COPY --from=buildStage /build/{{appname}}-api .
ENTRYPOINT ["./{{appname}}-api"]
"#;

pub(super) const REMOTE_WEB: &str = r#"# --- frontend building -------------------------------------------------------
FROM node:alpine AS builder
WORKDIR /web
COPY {{web.srcdir}}/package*.json ./
RUN npm ci
COPY {{web.srcdir}}/. .
RUN npm run build

# --- serving -----------------------------------------------------------------
FROM nginx:alpine
COPY --from=builder /web/build /usr/share/nginx/html
EXPOSE 80
CMD ["nginx", "-g", "daemon off;"]
"#;
